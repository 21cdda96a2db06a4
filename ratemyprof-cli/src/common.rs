use async_trait::async_trait;
use erased_serde::Serializer;
use ratemyprof::Session;

/// A command that queries `session` and serializes what it finds.
#[async_trait]
pub trait Run {
    async fn run(
        &self,
        session: &Session,
        serializer: &mut (dyn Serializer + Send),
    ) -> anyhow::Result<()>;
}

#[macro_export]
macro_rules! run_impl_enum {
    ($i:ident, $self:ident, $session:ident, $ser:ident, $b:block) => {
        #[async_trait::async_trait]
        impl $crate::common::Run for $i {
            async fn run(
                &$self,
                $session: &ratemyprof::Session,
                $ser: &mut (dyn erased_serde::Serializer + Send),
            ) -> anyhow::Result<()> {
                $b;

                Ok(())
            }
        }
    };
}

#[macro_export]
macro_rules! run_impl_struct {
    ($i:ident, $b:ident) => {
        #[async_trait::async_trait]
        impl $crate::common::Run for $i {
            async fn run(
                &self,
                session: &ratemyprof::Session,
                serializer: &mut (dyn erased_serde::Serializer + Send),
            ) -> anyhow::Result<()> {
                $crate::common::Run::run(&self.$b, session, serializer).await
            }
        }
    };
}
