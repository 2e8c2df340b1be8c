//! Favorite toggles. The association row and the article's cached
//! `favorites_count` are written in one transaction so the counter always
//! equals the number of favoriting users.

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;
use std::collections::HashSet;
use tracing::{error, info};

use crate::article::models::Article;
use crate::db::schema::{articles, favorites};
use crate::types::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteState {
    NotFavorited,
    Favorited,
}

pub fn is_favorited_by(
    user_id: i32,
    article_id: i32,
    connection: &mut SqliteConnection,
) -> QueryResult<bool> {
    select(exists(
        favorites::table
            .filter(favorites::user_id.eq(user_id))
            .filter(favorites::article_id.eq(article_id)),
    ))
    .get_result(connection)
}

pub fn state(user_id: i32, article_id: i32, connection: &mut SqliteConnection) -> QueryResult<FavoriteState> {
    Ok(if is_favorited_by(user_id, article_id, connection)? {
        FavoriteState::Favorited
    } else {
        FavoriteState::NotFavorited
    })
}

/// Ids of every article `user_id` has favorited, fetched with one query.
pub fn favorite_ids(user_id: i32, connection: &mut SqliteConnection) -> QueryResult<HashSet<i32>> {
    let ids = favorites::table
        .filter(favorites::user_id.eq(user_id))
        .select(favorites::article_id)
        .load::<i32>(connection)?;
    Ok(ids.into_iter().collect())
}

fn favorited_by_count(article_id: i32, connection: &mut SqliteConnection) -> QueryResult<i64> {
    favorites::table
        .filter(favorites::article_id.eq(article_id))
        .count()
        .get_result(connection)
}

/// Reloads the article and fails if its counter drifted from the association.
fn reload_checked(article_id: i32, connection: &mut SqliteConnection) -> Result<Article, ApiError> {
    let article = Article::find(article_id, connection)?.ok_or(ApiError::NotFound)?;
    let favorited_by = favorited_by_count(article_id, connection)?;
    if i64::from(article.favorites_count) != favorited_by {
        error!(
            article_id,
            count = article.favorites_count,
            favorited_by,
            "favorites counter out of sync, rolling back"
        );
        return Err(ApiError::Inconsistent {
            article_id,
            count: article.favorites_count,
            favorited_by,
        });
    }
    Ok(article)
}

/// Marks `article` as favorited by `user_id`. Already favorited is a no-op.
pub fn favorite(user_id: i32, article: &Article, connection: &mut SqliteConnection) -> Result<Article, ApiError> {
    let article_id = article.id;
    connection.transaction::<_, ApiError, _>(|conn| {
        let inserted = diesel::insert_into(favorites::table)
            .values((
                favorites::user_id.eq(user_id),
                favorites::article_id.eq(article_id),
            ))
            .on_conflict((favorites::user_id, favorites::article_id))
            .do_nothing()
            .execute(conn)?;

        if inserted == 1 {
            diesel::update(articles::table.find(article_id))
                .set(articles::favorites_count.eq(articles::favorites_count + 1))
                .execute(conn)?;
            info!(user_id, article_id, "article favorited");
        }
        reload_checked(article_id, conn)
    })
}

/// Removes `article` from `user_id`'s favorites. Not favorited is a no-op.
pub fn unfavorite(user_id: i32, article: &Article, connection: &mut SqliteConnection) -> Result<Article, ApiError> {
    let article_id = article.id;
    connection.transaction::<_, ApiError, _>(|conn| {
        let removed = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::article_id.eq(article_id)),
        )
        .execute(conn)?;

        if removed == 1 {
            // never below zero, even if the counter had already drifted
            diesel::update(
                articles::table
                    .find(article_id)
                    .filter(articles::favorites_count.gt(0)),
            )
            .set(articles::favorites_count.eq(articles::favorites_count - 1))
            .execute(conn)?;
            info!(user_id, article_id, "article unfavorited");
        }
        reload_checked(article_id, conn)
    })
}

/// Toggles towards `target`, returning the article as stored afterwards.
pub fn transition(
    user_id: i32,
    article: &Article,
    target: FavoriteState,
    connection: &mut SqliteConnection,
) -> Result<Article, ApiError> {
    match target {
        FavoriteState::Favorited => favorite(user_id, article, connection),
        FavoriteState::NotFavorited => unfavorite(user_id, article, connection),
    }
}
