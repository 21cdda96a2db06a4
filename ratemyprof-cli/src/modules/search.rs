use structopt::StructOpt;

use crate::run_impl_enum;

#[derive(StructOpt)]
pub struct Search {
    /// Full or partial professor name
    name: String,
}

run_impl_enum!(Search, self, session, ser, {
    erased_serde::serialize(&session.search_professor(&self.name).await?, ser)?;
});
