mod cidr;
mod job;
mod list;
mod user;

pub use cidr::{CidrRow, NewCidr};
pub use job::{Action, CidrJob};
pub use list::{
    with_default_tag, List, ListChanges, ListType, NewList, DEFAULT_TAG, LIST_ID_PATTERN, MAX_DESCRIPTION_LEN,
    MAX_LIST_ID_LEN, MAX_TAG_LEN, TAG_PATTERN,
};
pub use user::{
    validate_login, NewUser, Role, User, LOGIN_PATTERN, MAX_LOGIN_LEN, MAX_PASSWORD_LEN, MIN_LOGIN_LEN,
    MIN_PASSWORD_LEN,
};
