//! Ordered route table deciding which strategy owns a request.
//!
//! Rules are evaluated top to bottom and the first match wins. Requests that
//! match nothing take the table's fallback route.

use std::fmt;

use axum::http::Method;

/// Path prefix owned by the AI service (forwarded with the full path).
pub const API_PREFIX: &str = "/api/";

/// Path prefix of the processing endpoint.
pub const PROCESS_PREFIX: &str = "/process";

/// Exact path of the composite health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// The strategy selected for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `OPTIONS`. Under [`create_router`](crate::gateway::create_router) the
    /// CORS layer answers these before dispatch; the rule still holds when the
    /// table is dispatched without that layer.
    Preflight,
    AiPassthrough,
    ProcessingForward,
    HealthCheck,
    UiPassthrough,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Preflight => "preflight",
            Route::AiPassthrough => "ai_passthrough",
            Route::ProcessingForward => "processing_forward",
            Route::HealthCheck => "health_check",
            Route::UiPassthrough => "ui_passthrough",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate half of a routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Method(Method),
    PathPrefix(&'static str),
    PathExact(&'static str),
}

impl Matcher {
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        match self {
            Matcher::Method(m) => m == method,
            Matcher::PathPrefix(prefix) => path.starts_with(prefix),
            Matcher::PathExact(exact) => path == *exact,
        }
    }

    /// True for matchers that only look at the path.
    #[cfg(test)]
    pub(crate) fn is_path_rule(&self) -> bool {
        !matches!(self, Matcher::Method(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub matcher: Matcher,
    pub route: Route,
}

/// Ordered list of rules plus the route taken when none match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<Rule>,
    fallback: Route,
}

impl Default for RouteTable {
    /// Preflight, `/api/`, `/process`, `/health`, then the UI for everything else.
    fn default() -> Self {
        RouteTable::new(Route::UiPassthrough)
            .rule(Matcher::Method(Method::OPTIONS), Route::Preflight)
            .rule(Matcher::PathPrefix(API_PREFIX), Route::AiPassthrough)
            .rule(Matcher::PathPrefix(PROCESS_PREFIX), Route::ProcessingForward)
            .rule(Matcher::PathExact(HEALTH_PATH), Route::HealthCheck)
    }
}

impl RouteTable {
    pub fn new(fallback: Route) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Appends a rule with the lowest priority so far.
    pub fn rule(mut self, matcher: Matcher, route: Route) -> Self {
        self.rules.push(Rule { matcher, route });
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallback(&self) -> Route {
        self.fallback
    }

    pub fn decide(&self, method: &Method, path: &str) -> Route {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(method, path))
            .map(|rule| rule.route)
            .unwrap_or(self.fallback)
    }

    /// All rules matching the request, in priority order.
    #[cfg(test)]
    pub(crate) fn matching<'a>(
        &'a self,
        method: &'a Method,
        path: &'a str,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.matcher.matches(method, path))
    }
}
