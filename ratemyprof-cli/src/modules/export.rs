use structopt::StructOpt;

use crate::run_impl_struct;

use self::target::Target;

#[derive(StructOpt)]
pub struct Export {
    #[structopt(subcommand)]
    target: Target,
}

run_impl_struct!(Export, target);

mod target {
    use crate::run_impl_enum;
    use std::path::PathBuf;
    use structopt::StructOpt;

    #[derive(StructOpt)]
    pub(super) enum Target {
        /// Every professor at the school (default: professors.csv)
        Professors {
            #[structopt(short, long, parse(from_os_str))]
            output: Option<PathBuf>,
        },
        /// One professor's ratings (default: TeacherID_<id>.csv)
        Ratings {
            id: u64,
            #[structopt(short, long, parse(from_os_str))]
            output: Option<PathBuf>,
        },
    }

    run_impl_enum!(Target, self, session, ser, {
        let written = match self {
            Self::Professors { output } => {
                session.write_professors_to_csv(output.as_deref()).await?
            }
            Self::Ratings { id, output } => {
                session.write_ratings_to_csv(*id, output.as_deref()).await?
            }
        };
        erased_serde::serialize(&written, ser)?;
    });
}
