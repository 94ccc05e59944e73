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
    use crate::helpers::{self, Harness, TOKEN};
    use imagefeed::v1::{Profile, ServiceError, TransportError};
    use serde_json::{Value, json};
    use std::sync::atomic::Ordering;
    use std::sync::mpsc;

    fn me_json(username: &str) -> Value {
        json!({
            "id": "u-1",
            "username": username,
            "first_name": "Jane",
            "last_name": "Doe",
            "bio": "Shoots mountains",
            "total_likes": 12
        })
    }

    #[tokio::test]
    async fn fetch_profile_updates_cache() {
        let mut h = Harness::new().authorized();
        let profile = h.services.profile.clone();
        let (count, listener) = helpers::counter();
        let _subscription = profile.did_change().subscribe(listener);

        let (tx, rx) = mpsc::channel();
        h.main_loop.enter(|| profile.fetch_profile(move |r| tx.send(r).unwrap()));
        let request = h.transport.request(0);
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.url.as_str(), "https://api.unsplash.com/me");
        assert_eq!(request.header("authorization"), Some(format!("Bearer {TOKEN}").as_str()));

        h.transport.respond_json(0, 200, me_json("jdoe"));
        h.pump().await;

        let expected = Profile {
            username: "jdoe".to_string(),
            name: "Jane Doe".to_string(),
            login_name: "@jdoe".to_string(),
            bio: Some("Shoots mountains".to_string()),
        };
        assert_eq!(rx.try_recv().unwrap().unwrap(), expected);
        assert_eq!(profile.profile(), Some(expected));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn newer_fetch_supersedes_older() {
        let mut h = Harness::new().authorized();
        let profile = h.services.profile.clone();
        let (first_tx, first_rx) = mpsc::channel();
        let (second_tx, second_rx) = mpsc::channel();
        h.main_loop.enter(|| {
            profile.fetch_profile(move |r| first_tx.send(r).unwrap());
            profile.fetch_profile(move |r| second_tx.send(r).unwrap());
        });
        assert_eq!(h.transport.request_count(), 2);

        h.transport.respond_json(1, 200, me_json("newer"));
        h.pump().await;
        h.pump().await;

        assert!(first_rx.try_recv().unwrap().unwrap_err().is_cancelled());
        assert_eq!(second_rx.try_recv().unwrap().unwrap().username, "newer");

        // The superseded response never lands
        h.transport.respond_json(0, 200, me_json("older"));
        h.assert_idle().await;
        assert_eq!(profile.profile().unwrap().username, "newer");
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_profile() {
        let mut h = Harness::new().authorized();
        let profile = h.services.profile.clone();
        h.main_loop.enter(|| profile.fetch_profile(|_| {}));
        h.transport.respond_json(0, 200, me_json("jdoe"));
        h.pump().await;

        let (tx, rx) = mpsc::channel();
        h.main_loop.enter(|| profile.fetch_profile(move |r| tx.send(r).unwrap()));
        h.transport.respond(1, 502, "");
        h.pump().await;

        assert!(matches!(rx.try_recv().unwrap(), Err(ServiceError::Network(_))));
        assert_eq!(profile.profile().unwrap().username, "jdoe");
    }

    #[tokio::test]
    async fn transport_cancellation_is_reported_and_cleared() {
        let mut h = Harness::new().authorized();
        let profile = h.services.profile.clone();
        let (tx, rx) = mpsc::channel();
        h.main_loop.enter(|| profile.fetch_profile(move |r| tx.send(r).unwrap()));
        h.transport.fail_with(0, TransportError::Cancelled);
        h.pump().await;
        assert!(rx.try_recv().unwrap().is_err());

        let (tx, rx) = mpsc::channel();
        h.main_loop.enter(|| profile.fetch_profile(move |r| tx.send(r).unwrap()));
        h.transport.respond_json(1, 200, me_json("jdoe"));
        h.pump().await;
        assert_eq!(rx.try_recv().unwrap().unwrap().username, "jdoe");
        assert_eq!(profile.profile().unwrap().username, "jdoe");
    }

    #[tokio::test]
    async fn clear_notifies_listeners() {
        let mut h = Harness::new().authorized();
        let profile = h.services.profile.clone();
        let profile_image = h.services.profile_image.clone();
        let (count, listener) = helpers::counter();
        let _profile_subscription = profile.did_change().subscribe(listener);
        let (image_count, image_listener) = helpers::counter();
        let _image_subscription = profile_image.did_change().subscribe(image_listener);

        h.main_loop.enter(|| {
            profile.clear();
            profile_image.clear();
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(image_count.load(Ordering::SeqCst), 1);
        assert_eq!(profile.profile(), None);
    }

    #[tokio::test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must be called on the main context")]
    async fn fetch_profile_off_main_context_panics() {
        let h = Harness::new().authorized();
        h.services.profile.fetch_profile(|_| {});
    }

    #[tokio::test]
    async fn profile_requires_token() {
        let mut h = Harness::new();
        let profile = h.services.profile.clone();
        let (tx, rx) = mpsc::channel();
        h.main_loop.enter(|| profile.fetch_profile(move |r| tx.send(r).unwrap()));
        assert!(matches!(rx.try_recv().unwrap(), Err(ServiceError::AuthenticationRequired)));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn avatar_prefers_small_image() {
        let mut h = Harness::new().authorized();
        let profile_image = h.services.profile_image.clone();
        let (count, listener) = helpers::counter();
        let _subscription = profile_image.did_change().subscribe(listener);

        let (tx, rx) = mpsc::channel();
        h.main_loop
            .enter(|| profile_image.fetch_profile_image_url("jdoe", move |r| tx.send(r).unwrap()));
        let request = h.transport.request(0);
        assert_eq!(request.url.as_str(), "https://api.unsplash.com/users/jdoe");
        assert_eq!(request.header("authorization"), Some(format!("Bearer {TOKEN}").as_str()));

        h.transport.respond_json(
            0,
            200,
            json!({
                "username": "jdoe",
                "profile_image": {
                    "small": "https://images.example/jdoe-32",
                    "medium": "https://images.example/jdoe-64",
                    "large": "https://images.example/jdoe-128"
                }
            }),
        );
        h.pump().await;

        assert_eq!(rx.try_recv().unwrap().unwrap(), "https://images.example/jdoe-32");
        assert_eq!(profile_image.avatar_url().as_deref(), Some("https://images.example/jdoe-32"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn avatar_falls_back_to_larger_sizes() {
        let mut h = Harness::new().authorized();
        let profile_image = h.services.profile_image.clone();
        let (tx, rx) = mpsc::channel();
        h.main_loop
            .enter(|| profile_image.fetch_profile_image_url("jdoe", move |r| tx.send(r).unwrap()));
        h.transport.respond_json(
            0,
            200,
            json!({"profile_image": {"medium": "https://images.example/jdoe-64"}}),
        );
        h.pump().await;
        assert_eq!(rx.try_recv().unwrap().unwrap(), "https://images.example/jdoe-64");
    }

    #[tokio::test]
    async fn avatar_missing_from_response() {
        let mut h = Harness::new().authorized();
        let profile_image = h.services.profile_image.clone();
        let (count, listener) = helpers::counter();
        let _subscription = profile_image.did_change().subscribe(listener);

        let (tx, rx) = mpsc::channel();
        h.main_loop
            .enter(|| profile_image.fetch_profile_image_url("jdoe", move |r| tx.send(r).unwrap()));
        h.transport.respond_json(0, 200, json!({"username": "jdoe"}));
        h.pump().await;

        assert!(matches!(rx.try_recv().unwrap(), Err(ServiceError::AvatarMissing)));
        assert_eq!(profile_image.avatar_url(), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn username_is_path_encoded() {
        let mut h = Harness::new().authorized();
        let profile_image = h.services.profile_image.clone();
        h.main_loop
            .enter(|| profile_image.fetch_profile_image_url("a b/c", |_| {}));
        assert_eq!(h.transport.request(0).url.path(), "/users/a%20b%2Fc");
    }
}
