//! The process-wide default resolver.
//!
//! Code that doesn’t want to pass a resolver around can use the default
//! resolver instead. It is created from the system’s configuration on first
//! use unless one was installed with [`set_default`] before.
//!
//! The transports of a resolver are bound to the runtime they were created
//! on. If the default resolver is used from more than one runtime, its
//! transports to a server fail once their runtime goes away and are
//! replaced when next needed.

use super::stub::StubResolver;
use parking_lot::{const_rwlock, RwLock};
use tracing::debug;

/// The default resolver, if it has been created yet.
static DEFAULT: RwLock<Option<StubResolver>> = const_rwlock(None);

/// Returns the default resolver.
///
/// Creates the resolver from the system configuration if necessary.
pub fn default_resolver() -> StubResolver {
    if let Some(resolver) = DEFAULT.read().as_ref() {
        return resolver.clone();
    }
    DEFAULT
        .write()
        .get_or_insert_with(|| {
            debug!("creating default resolver");
            StubResolver::new()
        })
        .clone()
}

/// Installs a new default resolver.
///
/// Returns the previous default resolver if there was one. It is not
/// closed so queries in flight on it can finish.
pub fn set_default(resolver: StubResolver) -> Option<StubResolver> {
    DEFAULT.write().replace(resolver)
}

/// Removes the default resolver and closes it.
///
/// The next call to [`default_resolver`] will create a new one.
pub fn reset_default() {
    let resolver = DEFAULT.write().take();
    if let Some(resolver) = resolver {
        resolver.close()
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::resolv::conf::ResolvConf;

    // All in one test since the registry is global.
    #[test]
    fn registry() {
        let mut conf = ResolvConf::new();
        conf.servers.push("192.0.2.1:53".parse().unwrap());
        let custom = StubResolver::from_conf(conf);

        reset_default();
        set_default(custom.clone());
        let current = default_resolver();
        assert_eq!(current.conf().servers, custom.conf().servers);
        assert!(current.same_as(&custom));

        let previous = set_default(StubResolver::from_conf(ResolvConf::new()));
        assert!(previous.map(|p| p.same_as(&custom)).unwrap_or(false));

        reset_default();
        assert!(!default_resolver().same_as(&custom));
        reset_default();
    }
}
