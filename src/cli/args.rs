use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "s3nav")]
#[command(version, about = "Browse S3 buckets from the terminal", long_about = None)]
pub struct Args {
    /// Connect to the local mock endpoint (http://localhost:9000) with static credentials
    #[arg(long, env = "S3NAV_MOCK")]
    pub mock: bool,
}
