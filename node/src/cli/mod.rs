use clap::Parser;

pub mod init;
pub mod run_node;

#[derive(Parser, Debug, Clone)]
#[command(about = "Proof-of-work block production coordinator")]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::InitCmd),
    RunNode(run_node::RunNodeCmd),
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.subcommand {
            Subcommand::Init(cmd) => cmd.execute(),
            Subcommand::RunNode(cmd) => cmd.execute().await,
        }
    }
}
