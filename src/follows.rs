//! Read side of the follow graph. Follow edges are written elsewhere; this
//! module only answers "whom does this user follow".

use diesel::prelude::*;

use crate::db::schema::followers;

#[derive(Debug, Clone, Copy, Queryable, Insertable, PartialEq, Eq)]
#[diesel(table_name = followers)]
pub struct Follow {
    pub follower_id: i32,
    pub following_id: i32,
}

impl Follow {
    /// Every edge where `follower` is the follower.
    pub fn edges_of(follower: i32, connection: &mut SqliteConnection) -> QueryResult<Vec<Follow>> {
        followers::table
            .filter(followers::follower_id.eq(follower))
            .select((followers::follower_id, followers::following_id))
            .load(connection)
    }
}

/// Distinct ids of the users `follower` follows, ascending.
pub fn following_ids(follower: i32, connection: &mut SqliteConnection) -> QueryResult<Vec<i32>> {
    let mut ids = Follow::edges_of(follower, connection)?
        .into_iter()
        .map(|edge| edge.following_id)
        .collect::<Vec<i32>>();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
