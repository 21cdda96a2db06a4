pub(crate) mod common;
mod logging;
mod modules;
mod options;

use std::io::stdout;

use anyhow::Context;
use erased_serde::Serializer;
use ratemyprof::Session;
use structopt::StructOpt;

use crate::common::Run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = options::Options::from_args();
    logging::init(opt.verbose);

    let session = Session::with_config(opt.school.as_str(), opt.config())
        .with_context(|| format!("could not open a session for school {}", opt.school))?;

    opt.command
        .run(
            &session,
            &mut <dyn Serializer>::erase(&mut serde_json::Serializer::pretty(stdout())),
        )
        .await?;

    println!();
    Ok(())
}
