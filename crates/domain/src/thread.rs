use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Comment, CommentId, TOP_LEVEL};

/// Anything that sits in a one-level comment thread.
pub trait Threaded {
    fn id(&self) -> CommentId;
    fn parent_id(&self) -> CommentId;
}

impl Threaded for Comment {
    fn id(&self) -> CommentId {
        self.id
    }

    fn parent_id(&self) -> CommentId {
        self.parent_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Thread<T> {
    pub root: T,
    pub replies: Vec<T>,
}

/// Buckets a flat list into threads by `parent_id`.
///
/// Roots keep their input order and so do replies within a thread. Replies
/// whose root is not in the list are dropped.
pub fn group_threads<T: Threaded>(items: Vec<T>) -> Vec<Thread<T>> {
    let mut threads: Vec<Thread<T>> = Vec::new();
    let mut index: HashMap<CommentId, usize> = HashMap::new();
    let mut replies: Vec<T> = Vec::new();

    for item in items {
        if item.parent_id() == TOP_LEVEL {
            index.insert(item.id(), threads.len());
            threads.push(Thread {
                root: item,
                replies: Vec::new(),
            });
        } else {
            replies.push(item);
        }
    }

    for reply in replies {
        if let Some(&i) = index.get(&reply.parent_id()) {
            threads[i].replies.push(reply);
        }
    }
    threads
}
