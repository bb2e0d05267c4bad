use super::Result;

/// Session lifecycle, as driven by the web application on every
/// request.
///
/// Every method reports success as a boolean, like the session save
/// handlers of most web frameworks, while storage failures surface
/// as errors.
pub trait SessionHandler {
    /// Prepares the handler for a new request.
    fn open(&mut self) -> Result<bool>;

    /// Releases the session once the request is done.
    fn close(&mut self) -> Result<bool>;

    /// Reads the data of the given session. Unknown and expired
    /// sessions read as an empty string.
    fn read(&mut self, id: &str) -> Result<String>;

    fn write(&mut self, id: &str, data: &str) -> Result<bool>;

    fn destroy(&mut self, id: &str) -> Result<bool>;

    /// Vacuums expired sessions. `expires` is an optional timestamp
    /// defaulting to the current time.
    fn gc(&mut self, expires: Option<i64>) -> Result<bool>;
}
