use structopt::StructOpt;

use crate::{run_impl_enum, run_impl_struct};

#[derive(StructOpt)]
pub struct Professor {
    #[structopt(subcommand)]
    lookup: Lookup,
}

run_impl_struct!(Professor, lookup);

#[derive(StructOpt)]
enum Lookup {
    /// By Rate My Professors id
    Id { id: u64 },
    /// By name; the first search result is used
    Name { name: String },
}

run_impl_enum!(Lookup, self, session, ser, {
    let professor = match self {
        Self::Id { id } => session.get_professor_by_id(*id).await?,
        Self::Name { name } => session.get_professor_by_name(name).await?,
    };
    erased_serde::serialize(&professor, ser)?;
});
