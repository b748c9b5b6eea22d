use clap_complete::{generate, Shell};

pub fn run(shell: Shell, cmd: &mut clap::Command) {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, &mut std::io::stdout());
}
