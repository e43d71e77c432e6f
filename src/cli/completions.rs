use crate::cli::args::{Cli, CompletionCommands};
use crate::utils::errors::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

const APP_NAME: &str = "keyvault-rs";

/// Bash helpers completing resource group names from the live subscription
const BASH_GROUP_COMPLETION: &str = r#"
_keyvault_rs_complete_groups() {
    local groups
    groups=$(keyvault-rs -q --raw group list 2>/dev/null | cut -f1)
    COMPREPLY=($(compgen -W "$groups" -- "${cur}"))
}

_keyvault_rs_override() {
    local cur prev words cword
    _init_completion || return

    case "$prev" in
        "show"|"resources"|"-g"|"--resource-group")
            case "${words[*]}" in
                *"vault show"*|*"group resources"*|*"vault list"*|*" run "*)
                    _keyvault_rs_complete_groups
                    return 0
                    ;;
            esac
            ;;
    esac

    # Fall back to the generated completion
    _keyvault-rs "$@"
}
"#;

pub fn handle_completion_command(command: &CompletionCommands) -> Result<()> {
    let shell = command.shell();
    let mut cmd = Cli::command();

    generate(shell, &mut cmd, APP_NAME, &mut io::stdout());

    if matches!(shell, Shell::Bash) {
        println!("{BASH_GROUP_COMPLETION}");
        println!("complete -F _keyvault_rs_override {APP_NAME}");
    }

    Ok(())
}
