//! Notification type definitions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    NewReply,        // Someone replied to your comment
    NewForumComment, // Someone commented on your topic
    NewLike,         // Someone liked your comment
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewReply => "new_reply",
            Self::NewForumComment => "new_forum_comment",
            Self::NewLike => "new_like",
        }
    }
}
