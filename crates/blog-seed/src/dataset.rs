//! The literal records inserted by a seed run.

use crate::models::{NewPost, NewUser};

/// A user and the posts to create with it in one write.
#[derive(Debug, Clone)]
pub struct UserSeed {
    pub user: NewUser,
    pub posts: Vec<NewPost>,
}

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const BOB_EMAIL: &str = "bob@example.com";

pub fn alice() -> UserSeed {
    UserSeed {
        user: NewUser::new("Alice", ALICE_EMAIL),
        posts: vec![
            NewPost::new("Alice First Post")
                .content("This is Alice's first post.")
                .published(true),
            // Left unpublished through the default.
            NewPost::new("Alice Second Post").content("Another interesting post by Alice."),
        ],
    }
}

pub fn bob() -> UserSeed {
    UserSeed {
        user: NewUser::new("Bob", BOB_EMAIL),
        posts: vec![
            NewPost::new("Bob's Post")
                .content("Bob shares his thoughts.")
                .published(false),
        ],
    }
}

pub fn lonely_post() -> NewPost {
    NewPost::new("Lonely Post")
        .content("This post does not have an author assigned.")
        .published(false)
}
