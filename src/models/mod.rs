pub mod company;
pub mod job;
pub mod user;

pub use company::{Company, CompanyDetail, CompanyFilter, CompanyJob, CompanyUpdate, NewCompany};
pub use job::{Job, JobFilter, JobUpdate, NewJob};
pub use user::{NewUser, User, UserDetail, UserUpdate};

use serde::{Deserialize, Deserializer};

/// For patch fields: a missing key stays `None`, an explicit `null` becomes
/// `Some(None)`. Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
