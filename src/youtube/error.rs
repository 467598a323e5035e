/// Reasons a caption track could not be retrieved for one video
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript found for video {0} in languages {1:?}")]
    NoTranscriptFound(String, Vec<String>),

    #[error("Video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("Video {0} is unplayable: {1}")]
    VideoUnplayable(String, String),

    #[error("Requests for video {0} are being blocked by YouTube")]
    RequestBlocked(String),

    #[error("Video {0} requires a PO token to fetch captions")]
    PoTokenRequired(String),

    #[error("Could not parse YouTube data for video {0}")]
    Unparsable(String),

    #[error("HTTP error: {0}")]
    Http(String),
}
