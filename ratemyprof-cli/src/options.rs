use clap::AppSettings;
use ratemyprof::Config;
use structopt::StructOpt;

use crate::{
    common::Run,
    modules::{export::Export, professor::Professor, search::Search},
    run_impl_enum,
};

#[derive(StructOpt)]
#[structopt(
    name = "ratemyprof-cli",
    about = "Query Rate My Professors for one university",
    global_settings = &[AppSettings::ColoredHelp, AppSettings::VersionlessSubcommands]
)]
pub struct Options {
    /// Rate My Professors id of the university
    #[structopt(short, long, default_value = "1074")]
    pub school: String,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Results requested per page
    #[structopt(long, default_value = "20")]
    pub page_size: u32,

    /// Stop after this many pages of any query
    #[structopt(long)]
    pub max_pages: Option<usize>,

    /// GraphQL endpoint to query instead of the public one
    #[structopt(long)]
    pub endpoint: Option<String>,

    #[structopt(subcommand)]
    pub command: Command,
}

impl Options {
    pub fn config(&self) -> Config {
        let default = Config::default();
        Config {
            endpoint: self.endpoint.clone().unwrap_or(default.endpoint),
            page_size: self.page_size,
            max_pages: self.max_pages,
            ..default
        }
    }
}

#[derive(StructOpt)]
pub enum Command {
    /// Search professors by name
    Search(Search),
    /// Fetch one professor with all ratings
    Professor(Professor),
    /// List every professor at the school
    List,
    /// Show the school's name and location
    School,
    /// Write professors or ratings to CSV
    Export(Export),
}

run_impl_enum!(Command, self, session, ser, {
    match self {
        Self::Search(s) => s.run(session, ser).await?,
        Self::Professor(p) => p.run(session, ser).await?,
        Self::List => {
            erased_serde::serialize(&session.list_professors().await?, ser)?;
        }
        Self::School => {
            erased_serde::serialize(&session.school().await?, ser)?;
        }
        Self::Export(e) => e.run(session, ser).await?,
    }
});
