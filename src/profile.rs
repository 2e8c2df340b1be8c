use serde::Serialize;
use std::borrow::Cow;

use crate::users::models::User;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Profile<'a> {
    pub username: Cow<'a, str>,
    pub bio: Option<Cow<'a, str>>,
    pub image: Option<Cow<'a, str>>,
    pub following: bool,
}

impl<'a> Profile<'a> {
    pub fn of(user: &'a User, following: bool) -> Self {
        Profile {
            username: Cow::Borrowed(&user.username),
            bio: user.bio.as_deref().map(Cow::Borrowed),
            image: user.image.as_deref().map(Cow::Borrowed),
            following,
        }
    }

    pub fn into_owned(self) -> Profile<'static> {
        Profile {
            username: Cow::Owned(self.username.into_owned()),
            bio: self.bio.map(|v| Cow::Owned(v.into_owned())),
            image: self.image.map(|v| Cow::Owned(v.into_owned())),
            following: self.following,
        }
    }
}
