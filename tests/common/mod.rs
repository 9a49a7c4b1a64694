use assert_cmd::Command;

pub fn studyvault_cmd() -> Command {
    let mut cmd = Command::cargo_bin("studyvault").unwrap();
    cmd.env_remove("STUDYVAULT_ROOT");
    cmd.env_remove("STUDYVAULT_USER");
    cmd.env_remove("RUST_LOG");
    cmd
}
