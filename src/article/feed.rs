//! Listing and feed composition: resolves username filters to ids, asks the
//! store for a page, then annotates every article for the caller.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::article::favorites;
use crate::article::models::{Article, ArticleFilter, Paging};
use crate::follows;
use crate::profile::Profile;
use crate::types::{ApiError, Validate, ValidationError};
use crate::users::models::User;
use crate::utils::serialize_date;

#[derive(Debug, Default, Clone, FromForm)]
pub struct ArticleQuery {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ArticleQuery {
    pub fn paging(&self) -> Paging {
        Paging {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl Validate for ArticleQuery {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let errors = validate_paging(&self.paging());
        errors.into_result(self)
    }
}

pub fn validate_paging(paging: &Paging) -> ValidationError {
    let mut errors = ValidationError::default();
    if paging.limit.map_or(false, |limit| limit < 0) {
        errors.add_error("limit", "must not be negative");
    }
    if paging.offset.map_or(false, |offset| offset < 0) {
        errors.add_error("offset", "must not be negative");
    }
    errors
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    #[serde(serialize_with = "serialize_date")]
    pub updated_at: NaiveDateTime,
    pub favorited: bool,
    pub favorites_count: i32,
    pub author: Profile<'static>,
}

impl ArticleView {
    pub fn new(article: Article, author: Profile<'static>, favorited: bool) -> Self {
        ArticleView {
            slug: article.slug,
            title: article.title,
            description: article.description,
            body: article.body,
            tag_list: article.tag_list.0,
            created_at: article.created_at,
            updated_at: article.updated_at,
            favorited,
            favorites_count: article.favorites_count,
            author,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub article: ArticleView,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesPage {
    pub articles: Vec<ArticleView>,
    pub articles_count: i64,
}

/// What the caller has favorited and whom they follow, loaded once per
/// request. Anonymous callers get empty sets.
#[derive(Debug, Default)]
struct Viewer {
    favorites: HashSet<i32>,
    following: HashSet<i32>,
}

impl Viewer {
    fn load(acting_user_id: Option<i32>, connection: &mut SqliteConnection) -> QueryResult<Viewer> {
        match acting_user_id {
            None => Ok(Viewer::default()),
            Some(user_id) => Ok(Viewer {
                favorites: favorites::favorite_ids(user_id, connection)?,
                following: follows::following_ids(user_id, connection)?
                    .into_iter()
                    .collect(),
            }),
        }
    }
}

fn annotate(
    articles: Vec<Article>,
    viewer: &Viewer,
    connection: &mut SqliteConnection,
) -> Result<Vec<ArticleView>, ApiError> {
    let mut author_ids = articles.iter().map(|a| a.author_id).collect::<Vec<i32>>();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = User::load_many(&author_ids, connection)?
        .into_iter()
        .map(|user| (user.id, user))
        .collect::<HashMap<_, _>>();

    articles
        .into_iter()
        .map(|article| {
            let author = authors.get(&article.author_id).ok_or(ApiError::NotFound)?;
            let profile = author
                .profile(viewer.following.contains(&author.id))
                .into_owned();
            let favorited = viewer.favorites.contains(&article.id);
            Ok(ArticleView::new(article, profile, favorited))
        })
        .collect()
}

/// A blank query parameter means the filter was not given.
fn given(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|value| !value.trim().is_empty())
}

/// Lists articles matching `query`, newest first.
///
/// `favorited` and `author` name users; an unknown name (or a user with no
/// favorites) matches nothing rather than failing. `articles_count` counts
/// every match, ignoring `limit` and `offset`.
pub fn list_articles(
    acting_user_id: Option<i32>,
    query: &ArticleQuery,
    connection: &mut SqliteConnection,
) -> Result<ArticlesPage, ApiError> {
    let mut filter = ArticleFilter {
        tag: given(&query.tag).map(String::from),
        ..ArticleFilter::default()
    };

    if let Some(name) = given(&query.favorited) {
        match User::find_by_name(name, connection)? {
            Some(user) => filter.favorited_by = Some(user.id),
            None => {
                debug!(favorited = name, "unknown user in favorited filter");
                return Ok(ArticlesPage::default());
            }
        }
    }

    if let Some(name) = given(&query.author) {
        let ids = match User::find_by_name(name, connection)? {
            Some(user) => vec![user.id],
            None => Vec::new(),
        };
        filter.author_ids = Some(ids);
    }

    if filter.matches_nothing() {
        debug!(?query, "listing filter resolved to nothing");
        return Ok(ArticlesPage::default());
    }

    let (articles, articles_count) = Article::list(&filter, &query.paging(), connection)?;
    let viewer = Viewer::load(acting_user_id, connection)?;
    let articles = annotate(articles, &viewer, connection)?;
    debug!(returned = articles.len(), articles_count, "listed articles");
    Ok(ArticlesPage {
        articles,
        articles_count,
    })
}

/// Articles by the authors `acting_user_id` follows, newest first, annotated
/// like [`list_articles`]. Following nobody returns an empty page without
/// touching the article table.
pub fn get_feed(
    acting_user_id: i32,
    paging: &Paging,
    connection: &mut SqliteConnection,
) -> Result<ArticlesPage, ApiError> {
    let following = follows::following_ids(acting_user_id, connection)?;
    if following.is_empty() {
        return Ok(ArticlesPage::default());
    }

    let filter = ArticleFilter {
        author_ids: Some(following.clone()),
        ..ArticleFilter::default()
    };
    let (articles, articles_count) = Article::list(&filter, paging, connection)?;
    let viewer = Viewer {
        favorites: favorites::favorite_ids(acting_user_id, connection)?,
        following: following.into_iter().collect(),
    };
    let articles = annotate(articles, &viewer, connection)?;
    Ok(ArticlesPage {
        articles,
        articles_count,
    })
}

/// A single article annotated for the caller.
pub fn view_article(
    acting_user_id: Option<i32>,
    article: Article,
    connection: &mut SqliteConnection,
) -> Result<ArticleView, ApiError> {
    let viewer = Viewer::load(acting_user_id, connection)?;
    let mut views = annotate(vec![article], &viewer, connection)?;
    views.pop().ok_or(ApiError::NotFound)
}
