use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    capgains completions bash > ~/.bash_completion.d/capgains\n\n\
                  Generate zsh completions:\n    capgains completions zsh > ~/.zfunc/_capgains\n\n\
                  Generate fish completions:\n    capgains completions fish > ~/.config/fish/completions/capgains.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
