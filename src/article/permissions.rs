use crate::article::models::Article;
use crate::types::ApiError;

pub fn can_mutate(article: &Article, acting_user_id: i32) -> bool {
    article.author_id == acting_user_id
}

/// Existence is checked before ownership: a missing article is `NotFound`
/// even for a caller who could never have written it.
pub fn assert_can_mutate(article: Option<Article>, acting_user_id: i32) -> Result<Article, ApiError> {
    let article = article.ok_or(ApiError::NotFound)?;
    if !can_mutate(&article, acting_user_id) {
        return Err(ApiError::Forbidden);
    }
    Ok(article)
}
