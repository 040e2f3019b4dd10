mod executor;
mod serializer;

pub use executor::MutationExecutor;
pub(crate) use serializer::IdSerializer;
