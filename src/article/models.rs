use chrono::{NaiveDateTime, Utc};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::dsl::exists;
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::Sqlite;
use diesel::{define_sql_function, select, IntoSql};
use serde::{Deserialize, Serialize};

use crate::db::schema::{articles, favorites};

const TAG_SEPARATOR: char = ',';

// Byte position of `needle` in `haystack`, 0 when absent. Case-sensitive,
// unlike `LIKE`.
define_sql_function!(fn instr(haystack: Text, needle: Text) -> Integer);

/// Ordered tags, stored as one comma separated text column.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[diesel(sql_type = Text)]
#[serde(transparent)]
pub struct TagList(pub Vec<String>);

impl TagList {
    fn encode(&self) -> String {
        self.0.join(",")
    }

    fn decode(raw: &str) -> TagList {
        if raw.is_empty() {
            return TagList::default();
        }
        TagList(raw.split(TAG_SEPARATOR).map(String::from).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// A tag can be stored only if it survives the round trip through the
    /// column encoding.
    pub fn is_storable(tag: &str) -> bool {
        !tag.trim().is_empty() && !tag.contains(TAG_SEPARATOR)
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        TagList(tags)
    }
}

impl ToSql<Text, Sqlite> for TagList {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.encode());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for TagList {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(TagList::decode(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = articles)]
pub struct Article {
    pub id: i32,
    pub author_id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: TagList,
    pub favorites_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    pub author_id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: TagList,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Authored fields an update may replace; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = articles)]
struct ArticleChanges {
    title: Option<String>,
    description: Option<String>,
    body: Option<String>,
    tag_list: Option<TagList>,
    updated_at: NaiveDateTime,
}

/// Store-level filter; usernames are resolved to ids before reaching it.
#[derive(Debug, Default, Clone)]
pub struct ArticleFilter {
    /// Exact, case-sensitive membership in the article's tags.
    pub tag: Option<String>,
    pub author_ids: Option<Vec<i32>>,
    /// Only articles this user has favorited, resolved in the database.
    pub favorited_by: Option<i32>,
}

impl ArticleFilter {
    /// An author filter resolved to the empty set can never match.
    pub fn matches_nothing(&self) -> bool {
        self.author_ids.as_ref().map_or(false, |ids| ids.is_empty())
    }

    fn apply<'a>(&self, mut query: articles::BoxedQuery<'a, Sqlite>) -> articles::BoxedQuery<'a, Sqlite> {
        if let Some(tag) = &self.tag {
            let needle = format!("{sep}{tag}{sep}", sep = TAG_SEPARATOR, tag = tag);
            let haystack = ",".into_sql::<Text>().concat(articles::tag_list).concat(",");
            query = query.filter(instr(haystack, needle).gt(0));
        }
        if let Some(ids) = &self.author_ids {
            query = query.filter(articles::author_id.eq_any(ids.clone()));
        }
        if let Some(user_id) = self.favorited_by {
            query = query.filter(
                articles::id.eq_any(
                    favorites::table
                        .filter(favorites::user_id.eq(user_id))
                        .select(favorites::article_id),
                ),
            );
        }
        query
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Article {
    pub fn find_by_slug(slug: &str, connection: &mut SqliteConnection) -> QueryResult<Option<Article>> {
        articles::table
            .filter(articles::slug.eq(slug))
            .select(Article::as_select())
            .first(connection)
            .optional()
    }

    pub fn find(article_id: i32, connection: &mut SqliteConnection) -> QueryResult<Option<Article>> {
        articles::table
            .find(article_id)
            .select(Article::as_select())
            .first(connection)
            .optional()
    }

    pub fn slug_exists(slug: &str, connection: &mut SqliteConnection) -> QueryResult<bool> {
        select(exists(articles::table.filter(articles::slug.eq(slug)))).get_result(connection)
    }

    /// Matching articles newest first, plus the number of matches before
    /// `paging` was applied.
    pub fn list(
        filter: &ArticleFilter,
        paging: &Paging,
        connection: &mut SqliteConnection,
    ) -> QueryResult<(Vec<Article>, i64)> {
        if filter.matches_nothing() {
            return Ok((Vec::new(), 0));
        }

        let total = filter
            .apply(articles::table.into_boxed())
            .count()
            .get_result::<i64>(connection)?;

        let mut query = filter
            .apply(articles::table.into_boxed())
            .order((articles::created_at.desc(), articles::id.desc()));
        if let Some(limit) = paging.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = paging.offset {
            query = query.offset(offset);
        }
        let items = query.select(Article::as_select()).load(connection)?;
        Ok((items, total))
    }

    pub fn update(&self, patch: ArticlePatch, connection: &mut SqliteConnection) -> QueryResult<Article> {
        let changes = ArticleChanges {
            title: patch.title,
            description: patch.description,
            body: patch.body,
            tag_list: patch.tag_list.map(TagList::from),
            updated_at: Utc::now().naive_utc(),
        };
        diesel::update(articles::table.find(self.id))
            .set(&changes)
            .returning(Article::as_returning())
            .get_result(connection)
    }

    pub fn delete(&self, connection: &mut SqliteConnection) -> QueryResult<usize> {
        diesel::delete(articles::table.find(self.id)).execute(connection)
    }

    pub fn tags(&self) -> &[String] {
        self.tag_list.as_slice()
    }
}

impl NewArticle {
    pub fn new(
        author_id: i32,
        slug: String,
        title: String,
        description: String,
        body: String,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now().naive_utc();
        NewArticle {
            author_id,
            slug,
            title,
            description,
            body,
            tag_list: TagList(tags),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn insert(&self, connection: &mut SqliteConnection) -> QueryResult<Article> {
        diesel::insert_into(articles::table)
            .values(self)
            .returning(Article::as_returning())
            .get_result(connection)
    }

    /// Inserts unless the slug is already stored, in which case `None` is
    /// returned. Covers slugs claimed by a concurrent insert after any
    /// existence check.
    pub fn insert_unless_taken(&self, connection: &mut SqliteConnection) -> QueryResult<Option<Article>> {
        match self.insert(connection) {
            Ok(article) => Ok(Some(article)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
