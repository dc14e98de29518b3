use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{NewUser, User};
use crate::schema::user_login;

pub fn insert_user(conn: &mut PgConnection, new_user: &NewUser) -> QueryResult<User> {
    diesel::insert_into(user_login::table).values(new_user).get_result(conn)
}

pub fn find_user_by_login(conn: &mut PgConnection, login: &str) -> QueryResult<Option<User>> {
    user_login::table.filter(user_login::login.eq(login)).first(conn).optional()
}

pub fn find_user_by_id(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<User>> {
    user_login::table.filter(user_login::id.eq(id)).first(conn).optional()
}

pub fn update_password(
    conn: &mut PgConnection,
    user_id: Uuid,
    salt: &str,
    hashed_password: &str,
) -> QueryResult<usize> {
    diesel::update(user_login::table.filter(user_login::id.eq(user_id)))
        .set((user_login::salt.eq(salt), user_login::hashed_password.eq(hashed_password)))
        .execute(conn)
}
