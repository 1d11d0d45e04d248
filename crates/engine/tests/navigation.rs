mod support;

use story_engine::{
    CloseReason, Command, Event, MediaItem, NavigationDirection, PlaybackState, Rail,
    RewindLanding, SessionConfig, Story, StoryCollection, TapDirection, TapZone, User, UserId,
};

use support::{Harness, RendererCall, collection, story, story_with_items};

#[test]
fn rewind_at_first_item_requests_previous_page_and_lands_on_last_item() {
    let mut h = Harness::new(&[("alice", 3), ("bob", 2)]);
    h.open("bob");
    h.resolve("bob-0", 2.0);

    assert_eq!(
        h.tap(TapZone::Rewind),
        vec![
            Event::TrackFinished {
                item_index: 0,
                cause: TapDirection::Rewind,
            },
            Event::PageRequested {
                from: 1,
                to: 0,
                direction: NavigationDirection::Previous,
            },
        ]
    );

    h.send(Command::ScrollStarted);
    let events = h.send(Command::PageSettled { page: 0 });
    assert!(matches!(
        &events[..],
        [Event::ItemStarted {
            page: 0,
            item_index: 2,
            ..
        }]
    ));
    assert_eq!(h.progress(), vec![1.0, 1.0, 0.0]);
}

#[test]
fn rewind_landing_can_target_first_item() {
    let config = SessionConfig {
        rewind_landing: RewindLanding::FirstItem,
        ..SessionConfig::default()
    };
    let mut h = Harness::with_config(&[("alice", 3), ("bob", 1)], config);
    h.open("bob");
    h.resolve("bob-0", 1.0);
    h.tap(TapZone::Rewind);

    let events = h.send(Command::PageSettled { page: 0 });
    assert!(matches!(
        &events[..],
        [Event::ItemStarted { item_index: 0, .. }]
    ));
}

#[test]
fn rewind_inside_story_replays_previous_item() {
    let mut h = Harness::new(&[("alice", 3)]);
    h.open("alice");
    h.resolve("alice-0", 1.0);
    h.tap(TapZone::Skip);
    h.resolve("alice-1", 1.0);

    let events = h.tap(TapZone::Rewind);
    assert_eq!(
        events[0],
        Event::TrackFinished {
            item_index: 1,
            cause: TapDirection::Rewind,
        }
    );
    assert!(matches!(
        events[1],
        Event::ItemStarted { item_index: 0, .. }
    ));
    assert_eq!(h.progress(), vec![0.0, 0.0, 0.0]);
    assert!(
        h.renderer_calls()
            .iter()
            .filter(|call| matches!(call, RendererCall::Load(_, id) if id == "alice-0"))
            .count()
            == 2
    );
}

#[test]
fn rewind_on_first_page_restarts_current_item() {
    let mut h = Harness::new(&[("alice", 2), ("bob", 1)]);
    h.open("alice");
    h.resolve("alice-0", 2.0);
    h.tick_ms(500);

    assert_eq!(
        h.tap(TapZone::Rewind),
        vec![Event::TrackRestarted { item_index: 0 }]
    );
    assert!(h.renderer_calls().contains(&RendererCall::Seek(0)));
    assert_eq!(h.progress()[0], 0.0);

    h.tick_ms(1_000);
    assert_eq!(h.progress()[0], 0.5);
}

#[test]
fn tap_positions_map_to_zones() {
    let mut h = Harness::new(&[("alice", 2), ("bob", 1)]);
    h.open("bob");
    h.resolve("bob-0", 1.0);

    let events = h.send(Command::TapAt {
        x: 20.0,
        width: 300.0,
    });
    assert!(matches!(
        events.last(),
        Some(Event::PageRequested {
            direction: NavigationDirection::Previous,
            ..
        })
    ));
}

#[test]
fn read_fact_is_published_once_across_revisits() {
    let mut h = Harness::new(&[("alice", 1), ("bob", 1)]);
    let reads = h.engine.subscribe_reads();
    let mut rail = Rail::new(h.engine.stories().clone());

    h.open("alice");
    h.resolve("alice-0", 1.0);
    assert!(
        h.tap(TapZone::Skip)
            .contains(&Event::StoryRead {
                user: UserId::from("alice"),
            })
    );

    h.send(Command::PageSettled { page: 1 });
    h.resolve("bob-0", 1.0);
    h.tap(TapZone::Rewind);
    h.send(Command::PageSettled { page: 0 });
    h.resolve("alice-0", 1.0);

    let events = h.tap(TapZone::Skip);
    assert!(!events.iter().any(|event| matches!(event, Event::StoryRead { .. })));
    assert!(matches!(events.last(), Some(Event::PageRequested { to: 1, .. })));

    assert_eq!(rail.drain(&reads), vec![0]);
    assert!(rail.stories().stories()[0].is_read());
}

#[test]
fn dismissal_mid_transition_keeps_published_read_fact() {
    let mut h = Harness::new(&[("alice", 1), ("bob", 1)]);
    let reads = h.engine.subscribe_reads();
    h.open("alice");
    h.resolve("alice-0", 1.0);
    h.tap(TapZone::Skip);

    assert_eq!(
        h.send(Command::Dismiss),
        vec![Event::Closed {
            reason: CloseReason::Dismissed,
        }]
    );
    let received: Vec<UserId> = reads.try_iter().map(|read| read.user).collect();
    assert_eq!(received, vec![UserId::from("alice")]);
    assert!(h.engine.handle_command(Command::PageSettled { page: 1 }).is_err());
}

#[test]
fn refresh_extending_bound_story_keeps_progress() {
    let mut h = Harness::new(&[("alice", 2), ("bob", 1)]);
    h.open("alice");
    h.resolve("alice-0", 2.0);
    h.tick_ms(1_000);

    let events = h.send(Command::ReplaceStories(collection(&[("alice", 3), ("bob", 1)])));
    assert_eq!(
        events,
        vec![Event::StoryExtended {
            page: 0,
            appended: 1,
        }]
    );
    assert_eq!(h.progress(), vec![0.5, 0.0, 0.0]);

    let events = h.tick_ms(1_000);
    assert!(matches!(
        events.last(),
        Some(Event::ItemStarted { item_index: 1, .. })
    ));
}

#[test]
fn refresh_with_divergent_items_rebinds_from_start() {
    let mut h = Harness::new(&[("alice", 2)]);
    h.open("alice");
    h.resolve("alice-0", 2.0);
    h.tick_ms(1_000);
    let old_epoch = h.epoch();

    let replaced = StoryCollection::new(vec![story_with_items(
        "alice",
        &["fresh-0".to_owned(), "fresh-1".to_owned()],
    )])
    .expect("valid collection");
    let events = h.send(Command::ReplaceStories(replaced));

    assert!(matches!(
        &events[..],
        [Event::ItemStarted { item_index: 0, .. }]
    ));
    assert_ne!(h.epoch(), old_epoch);
    assert!(h.renderer_calls().contains(&RendererCall::Release(old_epoch)));
}

#[test]
fn refresh_removing_bound_story_closes_session() {
    let mut h = Harness::new(&[("alice", 1), ("bob", 1)]);
    h.open("bob");

    let remaining = StoryCollection::new(vec![story("alice", 1)]).expect("valid collection");
    assert_eq!(
        h.send(Command::ReplaceStories(remaining)),
        vec![Event::Closed {
            reason: CloseReason::StoryRemoved,
        }]
    );
}

#[test]
fn refresh_moving_bound_story_follows_its_page() {
    let mut h = Harness::new(&[("alice", 1), ("bob", 2)]);
    h.open("bob");
    h.resolve("bob-0", 1.0);

    let reordered =
        StoryCollection::new(vec![story("bob", 2), story("alice", 1)]).expect("valid collection");
    assert!(h.send(Command::ReplaceStories(reordered)).is_empty());
    assert_eq!(h.engine.snapshot().expect("session is open").page, 0);

    assert_eq!(
        h.tap(TapZone::Rewind),
        vec![Event::TrackRestarted { item_index: 0 }]
    );
}

fn alice_with_locators(locators: &[&str]) -> StoryCollection {
    let items = locators
        .iter()
        .enumerate()
        .map(|(index, locator)| MediaItem::new(format!("alice-{index}"), *locator))
        .collect();
    let story = Story::new(User::new("alice", "alice"), false, items).expect("valid story");
    StoryCollection::new(vec![story]).expect("valid collection")
}

#[test]
fn settling_back_after_exhaustion_replays_last_item() {
    let mut h = Harness::new(&[("alice", 2), ("bob", 2)]);
    h.open("alice");
    h.resolve("alice-0", 1.0);
    h.tap(TapZone::Skip);
    h.resolve("alice-1", 1.0);
    assert!(matches!(
        h.tap(TapZone::Skip).last(),
        Some(Event::PageRequested { from: 0, to: 1, .. })
    ));
    let old_epoch = h.epoch();

    h.send(Command::ScrollStarted);
    let events = h.send(Command::PageSettled { page: 0 });
    assert!(matches!(
        &events[..],
        [Event::ItemStarted {
            page: 0,
            item_index: 1,
            ..
        }]
    ));
    assert_ne!(h.epoch(), old_epoch);
    let snapshot = h.engine.snapshot().expect("session is open");
    assert!(matches!(snapshot.state, PlaybackState::PlayingItem(_)));
    assert!(!snapshot.will_advance);

    h.resolve("alice-1", 2.0);
    h.tick_ms(1_000);
    assert_eq!(h.progress(), vec![1.0, 0.5]);

    let events = h.tap(TapZone::Skip);
    assert!(!events.iter().any(|event| matches!(event, Event::StoryRead { .. })));
    assert!(matches!(events.last(), Some(Event::PageRequested { to: 1, .. })));
}

#[test]
fn settling_back_after_rewind_past_start_restarts_story() {
    let mut h = Harness::new(&[("alice", 2), ("bob", 2)]);
    h.open("bob");
    h.resolve("bob-0", 1.0);
    assert!(matches!(
        h.tap(TapZone::Rewind).last(),
        Some(Event::PageRequested { from: 1, to: 0, .. })
    ));

    h.send(Command::ScrollStarted);
    let events = h.send(Command::PageSettled { page: 1 });
    assert!(matches!(
        &events[..],
        [Event::ItemStarted {
            page: 1,
            item_index: 0,
            ..
        }]
    ));

    h.resolve("bob-0", 1.0);
    let events = h.tick_ms(1_000);
    assert!(matches!(
        events.last(),
        Some(Event::ItemStarted { item_index: 1, .. })
    ));
    h.resolve("bob-1", 1.0);
    assert!(matches!(
        h.tap(TapZone::Rewind).last(),
        Some(Event::ItemStarted { item_index: 0, .. })
    ));
}

#[test]
fn refresh_replacing_current_media_reloads_it_in_place() {
    let mut h = Harness::new(&[("alice", 2)]);
    h.open("alice");
    h.resolve("alice-0", 1.0);
    h.tap(TapZone::Skip);
    h.resolve("alice-1", 2.0);
    h.tick_ms(500);
    let old_epoch = h.epoch();

    let events = h.send(Command::ReplaceStories(alice_with_locators(&[
        "file:///alice-0.mp4",
        "file:///alice-1-v2.mp4",
    ])));
    assert!(matches!(
        &events[..],
        [Event::ItemStarted { item_index: 1, .. }]
    ));
    let new_epoch = h.epoch();
    assert_ne!(new_epoch, old_epoch);
    assert!(h.renderer_calls().contains(&RendererCall::Release(old_epoch)));
    assert!(
        h.renderer_calls()
            .contains(&RendererCall::Load(new_epoch, "alice-1".to_owned()))
    );
    assert_eq!(h.progress(), vec![1.0, 0.0]);
}

#[test]
fn refresh_replacing_queued_media_preloads_it_silently() {
    let mut h = Harness::new(&[("alice", 2)]);
    h.open("alice");
    h.resolve("alice-0", 2.0);
    h.tick_ms(500);
    let epoch = h.epoch();

    let events = h.send(Command::ReplaceStories(alice_with_locators(&[
        "file:///alice-0.mp4",
        "file:///alice-1-v2.mp4",
    ])));
    assert!(events.is_empty());
    assert_eq!(h.epoch(), epoch);
    assert_eq!(
        h.renderer_calls()
            .iter()
            .filter(|call| **call == RendererCall::Preload(epoch, "alice-1".to_owned()))
            .count(),
        2
    );
    assert_eq!(h.progress(), vec![0.25, 0.0]);
}
