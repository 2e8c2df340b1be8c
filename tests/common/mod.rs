#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::connection::InstrumentationEvent;
use diesel::prelude::*;
use std::sync::{Arc, Mutex};

use realworld_articles::article::models::{Article, NewArticle};
use realworld_articles::article::slugs;
use realworld_articles::db;
use realworld_articles::db::schema::followers;
use realworld_articles::follows::Follow;
use realworld_articles::users::models::{NewUser, User};

pub const SECRET: &str = "test-secret";

/// Fresh in-memory database with the schema installed.
pub fn connection() -> SqliteConnection {
    db::establish(":memory:").expect("in-memory database")
}

pub fn user(conn: &mut SqliteConnection, name: &str) -> User {
    let email = format!("{}@example.com", name);
    NewUser {
        username: name,
        email: &email,
        bio: Some("writes things"),
        image: None,
    }
    .insert(conn)
    .expect("insert user")
}

pub fn follow(conn: &mut SqliteConnection, follower: &User, following: &User) {
    diesel::insert_into(followers::table)
        .values(&Follow {
            follower_id: follower.id,
            following_id: following.id,
        })
        .execute(conn)
        .expect("insert follow");
}

pub fn article(conn: &mut SqliteConnection, author: &User, title: &str, tags: &[&str]) -> Article {
    NewArticle::new(
        author.id,
        slugs::generate(title),
        title.to_string(),
        format!("about {}", title),
        format!("body of {}", title),
        tags.iter().map(|t| t.to_string()).collect(),
    )
    .insert(conn)
    .expect("insert article")
}

/// An article created `minutes_ago` minutes in the past.
pub fn article_aged(conn: &mut SqliteConnection, author: &User, title: &str, minutes_ago: i64) -> Article {
    let created: NaiveDateTime = Utc::now().naive_utc() - Duration::minutes(minutes_ago);
    let mut new_article = NewArticle::new(
        author.id,
        slugs::generate(title),
        title.to_string(),
        "aged".to_string(),
        "aged".to_string(),
        Vec::new(),
    );
    new_article.created_at = created;
    new_article.updated_at = created;
    new_article.insert(conn).expect("insert article")
}

/// Records the SQL of every query the connection starts.
#[derive(Clone, Default)]
pub struct QueryLog(Arc<Mutex<Vec<String>>>);

impl QueryLog {
    pub fn attach(conn: &mut SqliteConnection) -> QueryLog {
        let log = QueryLog::default();
        let sink = log.0.clone();
        conn.set_instrumentation(move |event: InstrumentationEvent<'_>| {
            if let InstrumentationEvent::StartQuery { query, .. } = event {
                if let Ok(mut queries) = sink.lock() {
                    queries.push(query.to_string());
                }
            }
        });
        log
    }

    pub fn queries(&self) -> Vec<String> {
        self.0.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn touching(&self, table: &str) -> usize {
        self.queries().iter().filter(|sql| sql.contains(table)).count()
    }
}
