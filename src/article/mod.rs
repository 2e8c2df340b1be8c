use diesel::prelude::*;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use tracing::info;

use crate::config::Config;
use crate::db::DbConnection;
use crate::types::*;
use crate::users::models::User;
use crate::users::{AuthUser, CurrentUser};

pub mod favorites;
pub mod feed;
pub mod models;
pub mod permissions;
pub mod slugs;

use self::favorites::FavoriteState;
use self::feed::{ArticleQuery, ArticleResponse, ArticleView, ArticlesPage};
use self::models::{Article, ArticlePatch, NewArticle, Paging, TagList};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetails {
    title: String,
    description: String,
    body: String,
    #[serde(default)]
    tag_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticle {
    article: ArticleDetails,
}

fn check_tags(tags: &[String], error: &mut ValidationError) {
    for tag in tags {
        if !TagList::is_storable(tag) {
            error.add_error("tagList", format!("invalid tag: {:?}", tag));
        }
    }
}

impl Validate for CreateArticle {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let mut error = ValidationError::default();
        if self.article.body.trim().is_empty() {
            error.add_error("body", "empty body");
        }

        if self.article.title.trim().is_empty() {
            error.add_error("title", "empty title");
        }

        if self.article.description.trim().is_empty() {
            error.add_error("description", "empty description");
        }

        check_tags(&self.article.tag_list, &mut error);
        error.into_result(self)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetails {
    title: Option<String>,
    description: Option<String>,
    body: Option<String>,
    tag_list: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticle {
    article: UpdateDetails,
}

impl Validate for UpdateArticle {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let mut error = ValidationError::default();
        let details = &self.article;
        let fields = [
            ("title", &details.title),
            ("description", &details.description),
            ("body", &details.body),
        ];
        for (name, value) in fields.iter() {
            if value.as_ref().map_or(false, |v| v.trim().is_empty()) {
                error.add_error(*name, format!("empty {}", name));
            }
        }
        if let Some(tags) = &details.tag_list {
            check_tags(tags, &mut error);
        }
        error.into_result(self)
    }
}

impl From<UpdateDetails> for ArticlePatch {
    fn from(details: UpdateDetails) -> Self {
        ArticlePatch {
            title: details.title,
            description: details.description,
            body: details.body,
            tag_list: details.tag_list,
        }
    }
}

fn find_article(slug: &str, connection: &mut SqliteConnection) -> Result<Article, ApiError> {
    Article::find_by_slug(slug, connection)?.ok_or(ApiError::NotFound)
}

#[get("/?<query..>")]
pub fn list(
    mut connection: DbConnection,
    user: Option<AuthUser>,
    query: ArticleQuery,
) -> ApiResult<ArticlesPage> {
    let query = query.validate()?;
    let page = feed::list_articles(user.map(|u| u.id), &query, &mut connection)?;
    Ok(Json(page))
}

#[get("/feed?<limit>&<offset>")]
pub fn personal_feed(
    mut connection: DbConnection,
    user: CurrentUser,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<ArticlesPage> {
    let user = user?;
    let paging = Paging { limit, offset };
    let errors = feed::validate_paging(&paging);
    errors.into_result(())?;
    let page = feed::get_feed(user.id, &paging, &mut connection)?;
    Ok(Json(page))
}

#[post("/", format = "json", data = "<payload>")]
pub fn create(
    mut connection: DbConnection,
    user: CurrentUser,
    config: &State<Config>,
    payload: Json<CreateArticle>,
) -> ApiResult<ArticleResponse> {
    let user = user?;
    let create = payload.validate()?.into_inner();
    let author = User::find(user.id, &mut connection)?.ok_or(ApiError::Unauthorized)?;
    let details = create.article;
    let retry_limit = config.slug_retry_limit;

    let article = connection.transaction::<_, ApiError, _>(|conn| {
        slugs::unique(&details.title, retry_limit, |candidate| {
            if Article::slug_exists(candidate, conn)? {
                return Ok(None);
            }
            let new_article = NewArticle::new(
                author.id,
                candidate.to_string(),
                details.title.clone(),
                details.description.clone(),
                details.body.clone(),
                details.tag_list.clone(),
            );
            Ok(new_article.insert_unless_taken(conn)?)
        })
    })?;
    info!(slug = %article.slug, author_id = author.id, "article created");

    let profile = author.profile(false).into_owned();
    Ok(Json(ArticleResponse {
        article: ArticleView::new(article, profile, false),
    }))
}

#[get("/<slug>")]
pub fn get(
    slug: String,
    mut connection: DbConnection,
    user: Option<AuthUser>,
) -> ApiResult<ArticleResponse> {
    let article = find_article(&slug, &mut connection)?;
    let view = feed::view_article(user.map(|u| u.id), article, &mut connection)?;
    Ok(Json(ArticleResponse { article: view }))
}

#[put("/<slug>", format = "json", data = "<payload>")]
pub fn update(
    slug: String,
    mut connection: DbConnection,
    user: CurrentUser,
    payload: Json<UpdateArticle>,
) -> ApiResult<ArticleResponse> {
    let user = user?;
    let changes = payload.validate()?.into_inner();
    let article = Article::find_by_slug(&slug, &mut connection)?;
    let article = permissions::assert_can_mutate(article, user.id)?;
    let updated = article.update(changes.article.into(), &mut connection)?;
    info!(slug = %updated.slug, "article updated");

    let view = feed::view_article(Some(user.id), updated, &mut connection)?;
    Ok(Json(ArticleResponse { article: view }))
}

#[delete("/<slug>")]
pub fn delete(slug: String, mut connection: DbConnection, user: CurrentUser) -> Result<Status, ApiError> {
    let user = user?;
    let article = Article::find_by_slug(&slug, &mut connection)?;
    let article = permissions::assert_can_mutate(article, user.id)?;
    article.delete(&mut connection)?;
    info!(%slug, "article deleted");
    Ok(Status::NoContent)
}

fn toggle_favorite(
    slug: &str,
    user: AuthUser,
    target: FavoriteState,
    connection: &mut SqliteConnection,
) -> ApiResult<ArticleResponse> {
    let article = find_article(slug, connection)?;
    let article = favorites::transition(user.id, &article, target, connection)?;
    let view = feed::view_article(Some(user.id), article, connection)?;
    Ok(Json(ArticleResponse { article: view }))
}

#[post("/<slug>/favorite")]
pub fn favorite(slug: String, mut connection: DbConnection, user: CurrentUser) -> ApiResult<ArticleResponse> {
    toggle_favorite(&slug, user?, FavoriteState::Favorited, &mut connection)
}

#[delete("/<slug>/favorite")]
pub fn unfavorite(slug: String, mut connection: DbConnection, user: CurrentUser) -> ApiResult<ArticleResponse> {
    toggle_favorite(&slug, user?, FavoriteState::NotFavorited, &mut connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(title: &str, description: &str, body: &str, tags: &[&str]) -> CreateArticle {
        CreateArticle {
            article: ArticleDetails {
                title: title.to_string(),
                description: description.to_string(),
                body: body.to_string(),
                tag_list: tags.iter().map(|t| t.to_string()).collect(),
            },
        }
    }

    #[test]
    fn create_requires_all_text_fields() {
        let errors = details(" ", "", "\n", &[]).validate().unwrap_err();
        assert_eq!(errors.messages("title"), ["empty title"]);
        assert_eq!(errors.messages("description"), ["empty description"]);
        assert_eq!(errors.messages("body"), ["empty body"]);
    }

    #[test]
    fn create_rejects_tags_with_commas() {
        let errors = details("t", "d", "b", &["ok", "a,b"]).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.messages("tagList").len(), 1);
    }

    #[test]
    fn create_accepts_missing_tag_list() {
        let create: CreateArticle = serde_json::from_str(
            r#"{"article": {"title": "t", "description": "d", "body": "b"}}"#,
        )
        .unwrap();
        let create = create.validate().unwrap();
        assert!(create.article.tag_list.is_empty());
    }

    #[test]
    fn update_rejects_blank_present_fields_only() {
        let update = UpdateArticle {
            article: UpdateDetails {
                title: Some("  ".to_string()),
                ..UpdateDetails::default()
            },
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.messages("title"), ["empty title"]);
        assert!(errors.messages("body").is_empty());

        let update = UpdateArticle {
            article: UpdateDetails::default(),
        };
        assert!(update.validate().is_ok());
    }
}
