//! Simple, owning request and response types.
//!
//! Frontends translate their http types into a [`Request`] and apply a [`Response`] afterwards.
//! Nothing in here is tied to a particular server library.
use std::borrow::Cow;
use std::collections::HashMap;
use std::iter::FromIterator;

use url::Url;

use crate::error::{ErrorKind, OAuthError};

/// The query parameter normal form.
///
/// Each key must appear at most once. A key that was received several times is not removed but
/// marked as poisoned, so that it can never pass validation and no component accidentally picks
/// one of the values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// The value is `None` if the key appeared at least twice.
    inner: HashMap<Cow<'static, str>, Option<Cow<'static, str>>>,
}

/// A looked up parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param<'a> {
    /// Not present, or present with an empty value.
    Absent,

    /// Present exactly once.
    Unique(&'a str),

    /// Present more than once.
    Repeated,
}

impl Params {
    /// Create an empty map.
    pub fn new() -> Self {
        Params::default()
    }

    /// Insert a key-value-pair or mark key as dead if already present.
    pub fn insert_or_poison<K, V>(&mut self, key: K, val: V)
    where
        K: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        let unique_val = Some(val.into());
        self.inner
            .entry(key.into())
            .and_modify(|val| *val = None)
            .or_insert(unique_val);
    }

    /// Mark a key as repeated, as if it had been sent with several values.
    pub fn poison<K: Into<Cow<'static, str>>>(&mut self, key: K) {
        self.inner.insert(key.into(), None);
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Param<'_> {
        match self.inner.get(key) {
            None => Param::Absent,
            Some(None) => Param::Repeated,
            Some(Some(val)) if val.is_empty() => Param::Absent,
            Some(Some(val)) => Param::Unique(val.as_ref()),
        }
    }

    /// Get the unique value associated with a key.
    ///
    /// Absent, empty and repeated parameters all yield `None`.
    pub fn unique_value(&self, key: &str) -> Option<&str> {
        self.get(key).value()
    }

    /// If the key was sent at all, even with an empty value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// If the map contains no parameters.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<'a> Param<'a> {
    /// The value if the parameter was present exactly once.
    pub fn value(self) -> Option<&'a str> {
        match self {
            Param::Unique(value) => Some(value),
            _ => None,
        }
    }

    /// Check a parameter that may be omitted.
    ///
    /// Absent parameters pass, present ones must satisfy the predicate. Repeated parameters fail.
    pub fn optional<F>(self, predicate: F) -> Result<Option<&'a str>, ()>
    where
        F: FnOnce(&str) -> bool,
    {
        match self {
            Param::Absent => Ok(None),
            Param::Unique(value) if predicate(value) => Ok(Some(value)),
            _ => Err(()),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<Cow<'static, str>>,
    V: Into<Cow<'static, str>>,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut target = Params::default();
        iter.into_iter()
            .for_each(|(k, v)| target.insert_or_poison(k, v));
        target
    }
}

/// A request as seen by the grant and response types.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// The http method, upper case.
    pub method: String,

    /// Header fields, keys are stored in lower case.
    pub headers: HashMap<String, String>,

    /// The key-value pairs in the url query component.
    pub query: Params,

    /// The key-value pairs of a `x-www-form-urlencoded` body.
    pub body: Params,
}

impl Request {
    /// An empty `GET` request.
    pub fn new() -> Self {
        Request {
            method: "GET".to_string(),
            ..Request::default()
        }
    }

    /// An empty `POST` request with a form body.
    pub fn post() -> Self {
        let mut request = Request {
            method: "POST".to_string(),
            ..Request::default()
        };
        request.set_header("content-type", "application/x-www-form-urlencoded");
        request
    }

    /// Replace the query parameters.
    pub fn with_query<I, K, V>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        self.query = query.into_iter().collect();
        self
    }

    /// Replace the body parameters.
    pub fn with_body<I, K, V>(mut self, body: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        self.body = body.into_iter().collect();
        self
    }

    /// Add a header field.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Set a header field, replacing any previous value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Get a header field, names are case insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Check the media type of the body.
    pub fn is(&self, media_type: &str) -> bool {
        self.header("content-type")
            .and_then(|value| value.split(';').next())
            .map_or(false, |value| value.trim().eq_ignore_ascii_case(media_type))
    }

    /// Look up a parameter in the body and fall back to the query.
    pub fn param(&self, key: &str) -> Param<'_> {
        match self.body.get(key) {
            Param::Absent => self.query.get(key),
            other => other,
        }
    }
}

/// The response of the authorization endpoint or an error response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,

    /// Header fields, keys are stored in lower case.
    pub headers: HashMap<String, String>,

    /// Encoded body of the response.
    pub body: Option<String>,
}

impl Response {
    /// A blank `200 OK` response.
    pub fn new() -> Self {
        Response::default()
    }

    /// Get a header field, names are case insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Set a header field, replacing any previous value.
    pub fn set(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// A response which will redirect the user-agent to the url.
    pub fn redirect(&mut self, url: &Url) {
        self.status = 302;
        self.set("location", url.as_str());
    }

    /// A direct error response with a json body.
    pub fn error(&mut self, error: &OAuthError) {
        self.status = error.code();
        if error.kind() == ErrorKind::UnauthorizedRequest {
            self.set("www-authenticate", "Bearer realm=\"Service\"");
        }
        self.set("content-type", "application/json");
        self.body = Some(error.to_json());
    }
}

impl Default for Response {
    fn default() -> Self {
        Response {
            status: 200,
            headers: HashMap::new(),
            body: None,
        }
    }
}
