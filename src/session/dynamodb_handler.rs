use chrono::Utc;
use log::{debug, trace};

use super::{Result, SessionConnection};

/// Session handler storing sessions through a [`SessionConnection`].
///
/// The handler keeps track of the session opened by the current
/// request, so that unchanged data is not written back and the
/// session lock is always released on close.
pub struct DynamoDbSessionHandler {
    connection: Box<dyn SessionConnection>,
    save_path: Option<String>,
    session_name: String,
    current_session_id: Option<String>,
    open_session_id: Option<String>,
    data_read: String,
    session_written: bool,
}

impl DynamoDbSessionHandler {
    pub fn new(connection: Box<dyn SessionConnection>) -> Self {
        Self {
            connection,
            save_path: None,
            session_name: String::new(),
            current_session_id: None,
            open_session_id: None,
            data_read: String::new(),
            session_written: false,
        }
    }

    pub fn save_path(&self) -> Option<&str> {
        self.save_path.as_deref()
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Prefixes the session id with the session name. Leading and
    /// trailing underscores are trimmed, so that an empty name or id
    /// does not leave a dangling separator.
    fn format_id(&self, id: &str) -> String {
        format!("{}_{}", self.session_name, id)
            .trim_matches('_')
            .to_owned()
    }

    pub fn open(&mut self, save_path: Option<&str>, session_name: &str) -> Result<bool> {
        self.save_path = save_path.map(ToOwned::to_owned);
        self.session_name = session_name.to_owned();
        Ok(true)
    }

    /// Touches the current session when it was not written during
    /// the request, which refreshes its expiration time and releases
    /// its lock.
    pub fn close(&mut self) -> Result<bool> {
        let id = match self.current_session_id.clone() {
            Some(id) => id,
            None => return Ok(true),
        };

        if self.open_session_id.as_deref() != Some(id.as_str()) || !self.session_written {
            trace!("touch session {}", id);
            self.session_written = false;
            self.connection.write(&self.format_id(&id), "", false)?;
            self.session_written = true;
        }

        Ok(self.session_written)
    }

    pub fn read(&mut self, id: &str) -> Result<String> {
        self.current_session_id = Some(id.to_owned());
        self.open_session_id = Some(id.to_owned());
        self.data_read.clear();

        let item = self.connection.read(&self.format_id(id))?;

        if let Some(item) = item {
            if let (Some(data), Some(expires)) = (item.data, item.expires) {
                if expires <= Utc::now().timestamp() {
                    debug!("session {} expired, destroying it", id);
                    self.destroy(id)?;
                } else {
                    self.data_read = data;
                }
            }
        }

        Ok(self.data_read.clone())
    }

    pub fn write(&mut self, id: &str, data: &str) -> Result<bool> {
        let is_changed =
            self.open_session_id.as_deref() != Some(id) || data != self.data_read;

        self.current_session_id = Some(id.to_owned());
        self.open_session_id = Some(id.to_owned());
        self.session_written = false;
        self.connection.write(&self.format_id(id), data, is_changed)?;
        self.session_written = true;

        Ok(true)
    }

    pub fn destroy(&mut self, id: &str) -> Result<bool> {
        self.current_session_id = Some(id.to_owned());
        self.open_session_id = Some(id.to_owned());
        self.session_written = false;
        self.connection.delete(&self.format_id(id))?;
        self.session_written = true;

        Ok(true)
    }

    /// Expired sessions are not collected here: scanning the table on
    /// random requests is too costly. Use
    /// [`DynamoDbSessionHandler::garbage_collect`] from a scheduled
    /// job instead.
    pub fn gc(&mut self, _max_lifetime: Option<i64>) -> Result<bool> {
        Ok(true)
    }

    /// Deletes every expired session, returning how many were
    /// deleted.
    pub fn garbage_collect(&self) -> Result<usize> {
        let deleted = self.connection.delete_expired()?;
        debug!("{} expired session(s) deleted", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use std::{
        cell::RefCell,
        collections::HashMap,
        rc::Rc,
    };

    use crate::session::{DynamoDbSessionHandler, Result, SessionConnection, SessionItem};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Read(String),
        Write(String, String, bool),
        Delete(String),
    }

    #[derive(Clone, Default)]
    struct MemoryConnection {
        items: Rc<RefCell<HashMap<String, SessionItem>>>,
        calls: Rc<RefCell<Vec<Call>>>,
    }

    impl SessionConnection for MemoryConnection {
        fn read(&self, id: &str) -> Result<Option<SessionItem>> {
            self.calls.borrow_mut().push(Call::Read(id.to_owned()));
            Ok(self.items.borrow().get(id).cloned())
        }

        fn write(&self, id: &str, data: &str, is_changed: bool) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Write(id.to_owned(), data.to_owned(), is_changed));
            let mut items = self.items.borrow_mut();
            let item = items.entry(id.to_owned()).or_default();
            item.expires = Some(Utc::now().timestamp() + 1440);
            if is_changed {
                item.data = Some(data.to_owned()).filter(|data| !data.is_empty());
            }
            Ok(())
        }

        fn delete(&self, id: &str) -> Result<()> {
            self.calls.borrow_mut().push(Call::Delete(id.to_owned()));
            self.items.borrow_mut().remove(id);
            Ok(())
        }

        fn delete_expired(&self) -> Result<usize> {
            let now = Utc::now().timestamp();
            let mut items = self.items.borrow_mut();
            let before = items.len();
            items.retain(|_, item| item.expires.map_or(true, |expires| expires > now));
            Ok(before - items.len())
        }
    }

    fn handler() -> (DynamoDbSessionHandler, MemoryConnection) {
        let conn = MemoryConnection::default();
        let mut handler = DynamoDbSessionHandler::new(Box::new(conn.clone()));
        handler.open(None, "sid").unwrap();
        (handler, conn)
    }

    fn insert(conn: &MemoryConnection, id: &str, data: &str, expires: i64) {
        conn.items.borrow_mut().insert(
            id.to_owned(),
            SessionItem {
                data: Some(data.to_owned()),
                expires: Some(expires),
            },
        );
    }

    #[test]
    fn formats_ids() {
        let mut handler = DynamoDbSessionHandler::new(Box::new(MemoryConnection::default()));
        handler.open(None, "app").unwrap();
        assert_eq!("app_abc", handler.format_id("abc"));
        assert_eq!("app", handler.format_id(""));

        handler.open(Some("/tmp"), "").unwrap();
        assert_eq!("abc", handler.format_id("abc"));
        assert_eq!(Some("/tmp"), handler.save_path());
    }

    #[test]
    fn reads_unknown_session_as_empty() {
        let (mut handler, conn) = handler();

        assert_eq!("", handler.read("abc").unwrap());
        assert_eq!(vec![Call::Read("sid_abc".into())], *conn.calls.borrow());
    }

    #[test]
    fn reads_then_skips_unchanged_data() {
        let (mut handler, conn) = handler();
        insert(&conn, "sid_abc", "count=1", Utc::now().timestamp() + 60);

        assert_eq!("count=1", handler.read("abc").unwrap());
        assert!(handler.write("abc", "count=1").unwrap());
        assert!(handler.close().unwrap());

        assert_eq!(
            vec![
                Call::Read("sid_abc".into()),
                Call::Write("sid_abc".into(), "count=1".into(), false),
            ],
            *conn.calls.borrow()
        );
    }

    #[test]
    fn writes_changed_data() {
        let (mut handler, conn) = handler();
        insert(&conn, "sid_abc", "old", Utc::now().timestamp() + 60);

        handler.read("abc").unwrap();
        handler.write("abc", "new").unwrap();

        assert_eq!(
            Call::Write("sid_abc".into(), "new".into(), true),
            conn.calls.borrow()[1]
        );
        assert_eq!(
            Some("new".to_owned()),
            conn.items.borrow()["sid_abc"].data
        );
    }

    #[test]
    fn destroys_expired_session_on_read() {
        let (mut handler, conn) = handler();
        insert(&conn, "sid_abc", "stale", Utc::now().timestamp() - 1);

        assert_eq!("", handler.read("abc").unwrap());
        assert!(conn.items.borrow().is_empty());
        assert_eq!(Call::Delete("sid_abc".into()), conn.calls.borrow()[1]);
    }

    #[test]
    fn touches_unwritten_session_on_close() {
        let (mut handler, conn) = handler();
        insert(&conn, "sid_abc", "data", Utc::now().timestamp() + 60);

        handler.read("abc").unwrap();
        assert!(handler.close().unwrap());

        assert_eq!(
            Call::Write("sid_abc".into(), "".into(), false),
            conn.calls.borrow()[1]
        );
        assert_eq!(
            Some("data".to_owned()),
            conn.items.borrow()["sid_abc"].data
        );
    }

    #[test]
    fn writes_regenerated_session_as_changed() {
        let (mut handler, conn) = handler();
        insert(&conn, "sid_old", "data", Utc::now().timestamp() + 60);

        handler.read("old").unwrap();
        handler.write("new", "data").unwrap();

        assert_eq!(
            Call::Write("sid_new".into(), "data".into(), true),
            conn.calls.borrow()[1]
        );
    }

    #[test]
    fn close_without_session_is_a_noop() {
        let (mut handler, conn) = handler();
        assert!(handler.close().unwrap());
        assert!(conn.calls.borrow().is_empty());
    }

    #[test]
    fn collects_expired_sessions_on_demand_only() {
        let (mut handler, conn) = handler();
        let now = Utc::now().timestamp();
        insert(&conn, "sid_a", "a", now - 10);
        insert(&conn, "sid_b", "b", now + 60);

        assert!(handler.gc(None).unwrap());
        assert_eq!(2, conn.items.borrow().len());

        assert_eq!(1, handler.garbage_collect().unwrap());
        assert!(conn.items.borrow().contains_key("sid_b"));
    }
}
