use std::convert::Infallible;

use rocket::request::{FromRequest, Outcome, Request};

/// Every `name=value` pair of the query string, in order.
///
/// Used as an equality filter on list/delete routes and to read the `type`
/// selector on create routes.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct QueryFilter {
    pairs: Vec<(String, String)>,
}

impl QueryFilter {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for QueryFilter {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        QueryFilter {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for QueryFilter {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let filter = match request.uri().query() {
            Some(query) => query.segments().collect(),
            None => QueryFilter::default(),
        };

        Outcome::Success(filter)
    }
}
