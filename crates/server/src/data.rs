use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

const COMMENTS_PER_POST: u64 = 5;

/// Deterministic mock data backing the scenario endpoints. Stands in for
/// the database the demos pretend to query; the traced operations around it
/// are what matter, not the rows.
#[derive(Clone)]
pub struct DataSet {
    users: Arc<Vec<User>>,
    posts: Arc<Vec<Post>>,
    comments: Arc<Vec<Comment>>,
}

impl DataSet {
    pub fn generate(post_count: usize) -> Self {
        let base = Utc::now();
        let names = ["Ada Lovelace", "Grace Hopper", "Edsger Dijkstra", "Barbara Liskov", "Tony Hoare"];

        let users = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let id = i as u64 + 1;
                let handle = name.split_whitespace().next().unwrap_or("user").to_lowercase();
                User {
                    id,
                    name: name.to_string(),
                    email: format!("{handle}@example.com"),
                    created_at: base - Duration::days(i as i64),
                }
            })
            .collect();

        let posts: Vec<Post> = (1..=post_count as u64)
            .map(|id| Post {
                id,
                user_id: (id - 1) % names.len() as u64 + 1,
                title: format!("Post {id}: notes on tracing"),
                body: format!("Body of demo post {id}."),
            })
            .collect();

        let comments = posts
            .iter()
            .flat_map(|post| {
                (1..=COMMENTS_PER_POST).map(|n| {
                    let id = (post.id - 1) * COMMENTS_PER_POST + n;
                    Comment {
                        id,
                        post_id: post.id,
                        name: format!("commenter-{id}"),
                        email: format!("commenter-{id}@example.com"),
                        body: format!("Comment {n} on post {}.", post.id),
                    }
                })
            })
            .collect();

        Self {
            users: Arc::new(users),
            posts: Arc::new(posts),
            comments: Arc::new(comments),
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.users.as_ref().clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.as_ref().clone()
    }

    pub fn post(&self, id: u64) -> Option<Post> {
        self.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.comments.as_ref().clone()
    }

    pub fn comments_for(&self, post_id: u64) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect()
    }
}
