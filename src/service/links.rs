use super::Service;
use crate::error::{Error, Result};
use crate::runtime::LinkMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Non-owning reference from a service to a peer it links to.
#[derive(Clone)]
pub(crate) struct Link {
    pub(crate) name: String,
    service: Weak<Service>,
}

impl Link {
    pub(crate) fn to(service: &Arc<Service>) -> Self {
        Self {
            name: service.name().to_string(),
            service: Arc::downgrade(service),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Map every running instance of each linked peer to an alias.
///
/// Aliases are the container names themselves. Peers are asked for their
/// current names, in declaration order; their own links are not followed.
pub(crate) async fn resolve_links(service_name: &str, links: &[Link]) -> Result<LinkMap> {
    let mut resolved = LinkMap::new();

    for link in links {
        let peer = link.service.upgrade().ok_or_else(|| Error::LinkUnavailable {
            service: service_name.to_string(),
            link: link.name.clone(),
        })?;

        for name in peer.get_names().await? {
            resolved.entry(name.clone()).or_insert(name);
        }
    }

    Ok(resolved)
}
