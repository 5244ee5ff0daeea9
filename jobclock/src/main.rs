use clap::Parser;
use eyre::Result;
use jobclock::command::JobclockCmd;
use jobclock::VERSION;

#[derive(Parser)]
#[command(version = VERSION)]
struct Jobclock {
    #[command(subcommand)]
    jobclock: JobclockCmd,
}

impl Jobclock {
    fn run(self) -> Result<()> {
        self.jobclock.run()
    }
}

fn main() -> Result<()> {
    Jobclock::parse().run()
}
