pub mod announcement;
pub mod event;
pub mod job;
pub mod payment;
pub mod user;

/// Business-rule violations raised by document methods
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("End date must be after start date")]
    EndBeforeStart,
    #[error("Expiry date must be after publish date")]
    ExpiryBeforePublish,
    #[error("Capacity cannot be less than current attendee count")]
    CapacityBelowAttendees,
    #[error("Location type is required")]
    LocationTypeRequired,
    #[error("Cannot RSVP to unpublished event")]
    EventNotPublished,
    #[error("Registration deadline has passed")]
    RegistrationClosed,
    #[error("Event is full")]
    EventFull,
    #[error("Already registered for this event")]
    AlreadyRegistered,
    #[error("Not registered for this event")]
    NotRegistered,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("Job is not accepting applications")]
    JobNotActive,
    #[error("Application deadline has passed")]
    ApplicationDeadlinePassed,
    #[error("Already applied to this job")]
    AlreadyApplied,
    #[error("Application not found")]
    ApplicationNotFound,
}
