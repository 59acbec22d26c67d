mod macros;
mod models;
#[cfg(test)]
mod testing;

pub(crate) use self::macros::log_debug;
pub(crate) use self::macros::log_warn;
pub(crate) use self::models::alloc;
pub(crate) use self::models::sync;
#[cfg(test)]
pub(crate) use self::testing::each_capacity;
