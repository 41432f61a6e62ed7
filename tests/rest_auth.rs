/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
mod helpers;

#[cfg(test)]
mod test {
    use crate::helpers::{self, API_KEY};
    use flickr::rest::{
        Client, FlickrError, HttpMethod, MemoryTokenStore, Permission, Request, TokenStore,
        token_key,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier};

    const NSID: &str = "12345@N01";

    #[test]
    fn permission_grid() {
        use Permission::*;
        let granted_required_expected = [
            (Read, Read, true),
            (Read, Write, false),
            (Read, Delete, false),
            (Write, Read, true),
            (Write, Write, true),
            (Write, Delete, false),
            (Delete, Read, true),
            (Delete, Write, true),
            (Delete, Delete, true),
        ];
        for (granted, required, expected) in granted_required_expected {
            assert_eq!(granted.satisfies(required), expected, "{granted} vs {required}");

            let h = helpers::harness();
            helpers::authenticate(&h, NSID, granted);
            assert_eq!(
                h.client.is_authenticated(Some(NSID), required).unwrap(),
                expected,
                "{granted} vs {required}"
            );
        }
    }

    #[test]
    fn nobody_is_never_authenticated() {
        let h = helpers::harness();
        assert!(!h.client.is_authenticated(None, Permission::Read).unwrap());
        assert!(!h.client.is_authenticated(Some(NSID), Permission::Read).unwrap());
        assert_eq!(h.transport.call_count(), 0);
    }

    #[test]
    fn begin_and_complete_round_trip() {
        let h = helpers::harness();
        h.transport.push(helpers::frob("frob-42"));
        h.transport
            .push(helpers::auth("token-abc", "write", NSID, "tester"));

        let url = h.client.begin_auth(Permission::Write).unwrap();
        assert!(url.starts_with(&h.client.config().auth_url));
        assert!(url.contains("frob=frob-42"));
        assert!(url.contains("perms=write"));
        assert!(url.contains(&format!("api_key={API_KEY}")));
        assert!(url.contains("api_sig="));
        assert_eq!(
            h.transport.calls()[0].param("method").as_deref(),
            Some("flickr.auth.getFrob")
        );

        let user = h.client.complete_auth().unwrap();
        assert_eq!(user.nsid, NSID);
        assert_eq!(user.username, "tester");
        assert_eq!(user.fullname, None);

        let exchange = h.transport.last_call();
        assert_eq!(exchange.param("method").as_deref(), Some("flickr.auth.getToken"));
        assert_eq!(exchange.param("frob").as_deref(), Some("frob-42"));

        let token = h.client.token_for(NSID).unwrap().unwrap();
        assert_eq!(token.token(), "token-abc");
        assert_eq!(token.permission(), Permission::Write);
        assert_eq!(h.client.permission_level(NSID).unwrap(), Some(Permission::Write));
        assert_eq!(
            helpers::stored(&h, &token_key(NSID)).as_deref(),
            Some("token-abc")
        );
        assert_eq!(h.client.auth_context().as_deref(), Some(NSID));
        assert_eq!(h.transport.call_count(), 2);
    }

    #[test]
    fn authenticated_requests_carry_the_token() {
        let h = helpers::harness();
        helpers::authenticate(&h, NSID, Permission::Read);
        h.transport.push(helpers::ok(""));
        Request::call(&h.client, HttpMethod::Get, "flickr.test.login")
            .unwrap()
            .send()
            .unwrap();
        let call = h.transport.last_call();
        assert_eq!(call.param("auth_token"), Some(format!("token-{NSID}")));
    }

    #[test]
    fn complete_without_begin_fails() {
        let h = helpers::harness();
        let err = h.client.complete_auth().unwrap_err();
        assert!(matches!(err, FlickrError::Auth(_)));
        assert_eq!(h.transport.call_count(), 0);
    }

    #[test]
    fn exchange_code_is_consumed_once() {
        let h = helpers::harness();
        helpers::authenticate(&h, NSID, Permission::Read);
        let err = h.client.complete_auth().unwrap_err();
        assert!(matches!(err, FlickrError::Auth(_)));
    }

    #[test]
    fn handshake_belongs_to_the_beginning_thread() {
        let h = helpers::harness();
        h.transport.push(helpers::frob("frob-1"));
        h.client.begin_auth(Permission::Read).unwrap();

        std::thread::scope(|s| {
            let err = s
                .spawn(|| h.client.complete_auth().unwrap_err())
                .join()
                .unwrap();
            assert!(matches!(err, FlickrError::Auth(_)));
        });

        h.transport.push(helpers::auth("tok", "read", NSID, "tester"));
        assert_eq!(h.client.complete_auth().unwrap().nsid, NSID);
    }

    #[test]
    fn expired_frob_is_an_auth_error() {
        let h = helpers::harness();
        h.transport.push(helpers::frob("frob-1"));
        h.transport.push(helpers::fail(108, "Invalid frob"));
        h.client.begin_auth(Permission::Read).unwrap();
        let err = h.client.complete_auth().unwrap_err();
        assert!(matches!(err, FlickrError::Auth(_)));
        assert_eq!(h.client.auth_context(), None);
    }

    #[test]
    fn token_without_user_is_resolved() {
        let h = helpers::harness();
        h.transport.push(helpers::frob("frob-1"));
        h.transport
            .push(helpers::ok("<auth><token>tok</token><perms>delete</perms></auth>"));
        h.transport.push(helpers::auth("tok", "delete", NSID, "tester"));
        h.client.begin_auth(Permission::Delete).unwrap();

        let user = h.client.complete_auth().unwrap();
        assert_eq!(user.nsid, NSID);
        let check = h.transport.last_call();
        assert_eq!(check.param("method").as_deref(), Some("flickr.auth.checkToken"));
        assert_eq!(check.param("auth_token").as_deref(), Some("tok"));
    }

    #[test]
    fn fresh_token_rejected_is_an_auth_error() {
        let h = helpers::harness();
        h.transport.push(helpers::frob("frob-1"));
        h.transport
            .push(helpers::ok("<auth><token>tok</token><perms>read</perms></auth>"));
        h.transport.push(helpers::fail(98, "Invalid auth token"));
        h.client.begin_auth(Permission::Read).unwrap();

        let err = h.client.complete_auth().unwrap_err();
        assert!(matches!(err, FlickrError::Auth(_)));
    }

    #[test]
    fn saved_token_is_validated_once() {
        let h = helpers::harness();
        h.store.put(&token_key(NSID), "saved-token").unwrap();
        h.transport
            .push(helpers::auth("saved-token", "write", NSID, "tester"));

        assert!(h.client.is_authenticated(Some(NSID), Permission::Write).unwrap());
        assert!(h.client.is_authenticated(Some(NSID), Permission::Read).unwrap());
        assert_eq!(h.transport.call_count(), 1);
        let check = h.transport.last_call();
        assert_eq!(check.param("method").as_deref(), Some("flickr.auth.checkToken"));
        assert_eq!(check.param("auth_token").as_deref(), Some("saved-token"));
    }

    #[test]
    fn saved_token_rejected_is_discarded() {
        let h = helpers::harness();
        h.store.put(&token_key(NSID), "stale-token").unwrap();
        h.transport.push(helpers::fail(98, "Invalid auth token"));

        assert!(h.client.token_for(NSID).unwrap().is_none());
        assert_eq!(helpers::stored(&h, &token_key(NSID)), None);
        assert!(!h.client.is_authenticated(Some(NSID), Permission::Read).unwrap());
        assert_eq!(h.transport.call_count(), 1);
    }

    // Hands out `stale` on the first read while the backing store already
    // holds the token of a newer login
    struct ReauthenticatedStore {
        inner: MemoryTokenStore,
        stale: String,
        first_read: AtomicBool,
    }

    impl TokenStore for ReauthenticatedStore {
        fn get(&self, key: &str) -> Result<Option<String>, FlickrError> {
            if self.first_read.swap(false, Ordering::SeqCst) {
                return Ok(Some(self.stale.clone()));
            }
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<(), FlickrError> {
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), FlickrError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn rejected_saved_token_keeps_newer_login() {
        let h = helpers::harness();
        let inner = MemoryTokenStore::default();
        inner.put(&token_key(NSID), "fresh-token").unwrap();
        let store = Arc::new(ReauthenticatedStore {
            inner,
            stale: "stale-token".to_string(),
            first_read: AtomicBool::new(true),
        });
        let client = Client::builder(h.client.config().clone())
            .transport(h.transport.clone())
            .token_store(store.clone())
            .build()
            .unwrap();
        h.transport.push(helpers::fail(98, "Invalid auth token"));

        assert!(client.token_for(NSID).unwrap().is_none());
        assert_eq!(
            h.transport.last_call().param("auth_token").as_deref(),
            Some("stale-token")
        );
        assert_eq!(
            store.get(&token_key(NSID)).unwrap().as_deref(),
            Some("fresh-token")
        );
    }

    #[test]
    fn concurrent_misses_share_one_token() {
        let h = helpers::harness();
        h.store.put(&token_key(NSID), "saved-token").unwrap();
        h.transport
            .push(helpers::auth("saved-token", "write", NSID, "tester"));
        h.transport
            .push(helpers::auth("saved-token", "write", NSID, "tester"));

        let barrier = Barrier::new(2);
        let (first, second) = std::thread::scope(|s| {
            let lookup = || {
                barrier.wait();
                h.client.token_for(NSID).unwrap().unwrap()
            };
            let a = s.spawn(lookup);
            let b = s.spawn(lookup);
            (a.join().unwrap(), b.join().unwrap())
        });
        assert!(Arc::ptr_eq(&first, &second));

        let calls = h.transport.call_count();
        assert!((1..=2).contains(&calls));
        let third = h.client.token_for(NSID).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(h.transport.call_count(), calls);
    }

    #[test]
    fn saved_token_other_failures_propagate() {
        let h = helpers::harness();
        h.store.put(&token_key(NSID), "saved-token").unwrap();
        h.transport.push(helpers::fail(105, "Service currently unavailable"));

        let err = h.client.token_for(NSID).unwrap_err();
        assert!(matches!(err, FlickrError::Service { code: 105, .. }));
        assert_eq!(
            helpers::stored(&h, &token_key(NSID)).as_deref(),
            Some("saved-token")
        );
    }

    #[test]
    fn invalidated_token_is_evicted_on_next_use() {
        let h = helpers::harness();
        helpers::authenticate(&h, NSID, Permission::Write);
        assert!(h.client.is_authenticated(Some(NSID), Permission::Write).unwrap());

        h.transport.push(helpers::fail(98, "Invalid auth token"));
        let err = Request::call(&h.client, HttpMethod::Get, "flickr.test.login")
            .unwrap()
            .send()
            .unwrap_err();
        assert!(err.is_invalid_token());

        let calls_before = h.transport.call_count();
        assert!(!h.client.is_authenticated(Some(NSID), Permission::Read).unwrap());
        assert_eq!(helpers::stored(&h, &token_key(NSID)), None);
        assert_eq!(h.transport.call_count(), calls_before);
    }

    #[test]
    fn rejection_of_an_old_token_keeps_a_newer_login() {
        let h = helpers::harness();
        helpers::authenticate(&h, NSID, Permission::Read);
        let stale = Request::call(&h.client, HttpMethod::Get, "flickr.test.login").unwrap();

        h.transport.push(helpers::frob("frob-2"));
        h.transport
            .push(helpers::auth("token-fresh", "write", NSID, "tester"));
        h.client.begin_auth(Permission::Write).unwrap();
        h.client.complete_auth().unwrap();

        h.transport.push(helpers::fail(98, "Invalid auth token"));
        let err = stale.send().unwrap_err();
        assert!(err.is_invalid_token());
        assert_eq!(
            h.transport.last_call().param("auth_token"),
            Some(format!("token-{NSID}"))
        );

        let calls = h.transport.call_count();
        let token = h.client.token_for(NSID).unwrap().unwrap();
        assert_eq!(token.token(), "token-fresh");
        assert_eq!(
            helpers::stored(&h, &token_key(NSID)).as_deref(),
            Some("token-fresh")
        );
        assert_eq!(h.transport.call_count(), calls);
    }

    #[test]
    fn request_for_unauthenticated_context_fails() {
        let h = helpers::harness();
        h.client.set_auth_context(NSID);
        let err = Request::call(&h.client, HttpMethod::Get, "flickr.test.login").unwrap_err();
        assert!(matches!(err, FlickrError::Auth(_)));
    }

    #[test]
    fn explicit_user_overrides_thread_context() {
        let h = helpers::harness();
        helpers::authenticate(&h, "111@N01", Permission::Read);
        helpers::authenticate(&h, "222@N01", Permission::Read);
        assert_eq!(h.client.auth_context().as_deref(), Some("222@N01"));

        let req = Request::for_user(
            &h.client,
            HttpMethod::Get,
            &h.client.config().rest_url,
            Some("111@N01"),
        )
        .unwrap();
        assert_eq!(req.auth_user(), Some("111@N01"));

        let anonymous =
            Request::for_user(&h.client, HttpMethod::Get, &h.client.config().rest_url, None)
                .unwrap();
        assert_eq!(anonymous.auth_user(), None);
        assert!(!anonymous.parameters().contains_key("auth_token"));
    }

    #[test]
    fn scoped_context_restores_previous_user() {
        let h = helpers::harness();
        h.client.set_auth_context("outer");
        {
            let _guard = h.client.scoped_auth_context("inner");
            assert_eq!(h.client.auth_context().as_deref(), Some("inner"));
            {
                let _nested = h.client.scoped_auth_context("innermost");
                assert_eq!(h.client.auth_context().as_deref(), Some("innermost"));
            }
            assert_eq!(h.client.auth_context().as_deref(), Some("inner"));
        }
        assert_eq!(h.client.auth_context().as_deref(), Some("outer"));

        h.client.reset_auth_context();
        {
            let _guard = h.client.scoped_auth_context("inner");
        }
        assert_eq!(h.client.auth_context(), None);
    }

    #[test]
    fn auth_context_is_per_thread() {
        let h = helpers::harness();
        h.client.set_auth_context(NSID);
        std::thread::scope(|s| {
            let seen = s.spawn(|| h.client.auth_context()).join().unwrap();
            assert_eq!(seen, None);
        });
        assert_eq!(h.client.auth_context().as_deref(), Some(NSID));
    }

    #[test]
    fn tokens_are_shared_between_threads() {
        let h = helpers::harness();
        helpers::authenticate(&h, NSID, Permission::Read);
        std::thread::scope(|s| {
            let authenticated = s
                .spawn(|| h.client.is_authenticated(Some(NSID), Permission::Read).unwrap())
                .join()
                .unwrap();
            assert!(authenticated);
        });
        assert_eq!(h.transport.call_count(), 2);
    }

    #[test]
    fn default_user_is_persisted() {
        let h = helpers::harness();
        assert_eq!(h.client.default_user().unwrap(), None);
        h.client.set_default_user(Some(NSID)).unwrap();
        assert_eq!(h.client.default_user().unwrap().as_deref(), Some(NSID));
        assert_eq!(helpers::stored(&h, "default_user").as_deref(), Some(NSID));
        h.client.set_default_user(None).unwrap();
        assert_eq!(h.client.default_user().unwrap(), None);
    }
}
