pub const HTTP: &str = "http";
pub const HTTPS: &str = "https";

/// Assembles a page URL from scheme, optional user info, host, optional
/// port, optional web context root, and optional subroot query.
///
/// The authority always ends in `/`; empty strings count as absent, so
/// `http://host:8080/` + context root `app` + subroot `login?x=1` becomes
/// `http://host:8080/app/login?x=1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    scheme: String,
    userinfo: Option<String>,
    host: String,
    port: Option<u16>,
    context_root: Option<String>,
    subroot: Option<String>,
}

impl PageUrl {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            userinfo: None,
            host: host.into(),
            port: None,
            context_root: None,
            subroot: None,
        }
    }

    pub fn http(host: impl Into<String>) -> Self {
        Self::new(HTTP, host)
    }

    pub fn https(host: impl Into<String>) -> Self {
        Self::new(HTTPS, host)
    }

    pub fn userinfo(mut self, userinfo: impl Into<String>) -> Self {
        self.userinfo = Some(userinfo.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn context_root(mut self, context_root: impl Into<String>) -> Self {
        self.context_root = Some(context_root.into());
        self
    }

    pub fn subroot(mut self, subroot: impl Into<String>) -> Self {
        self.subroot = Some(subroot.into());
        self
    }

    fn authority(&self) -> String {
        let user_tag = match self.userinfo.as_deref() {
            Some(u) if !u.is_empty() => format!("{}@", u),
            _ => String::new(),
        };
        let port_tag = match self.port {
            Some(p) => format!(":{}", p),
            None => String::new(),
        };
        format!("{}://{}{}{}/", self.scheme, user_tag, self.host, port_tag)
    }

    pub fn build(&self) -> String {
        let authority = self.authority();
        let context_root = self.context_root.as_deref().filter(|s| !s.is_empty());
        let subroot = self.subroot.as_deref().filter(|s| !s.is_empty());
        match (context_root, subroot) {
            (None, None) => authority,
            (None, Some(sub)) => format!("{}{}", authority, sub),
            (Some(root), None) => format!("{}{}", authority, root),
            (Some(root), Some(sub)) => format!("{}{}/{}", authority, root, sub),
        }
    }
}

impl std::fmt::Display for PageUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}
