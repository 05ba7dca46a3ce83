mod common;

use common::harness;
use mental_wellness_bot::{ChallengeId, Inbound, Messages, SubscriptionStore, load_messages_file};

fn text(chat_id: i64, t: &str) -> Inbound {
    Inbound::Text {
        chat_id,
        text: t.to_string(),
        first_name: Some("Asha".to_string()),
    }
}

fn texts() -> Messages {
    load_messages_file("messages/en.json")
}

fn press(chat_id: i64, data: &str) -> Inbound {
    Inbound::Callback {
        chat_id,
        data: data.to_string(),
    }
}

#[tokio::test]
async fn start_when_unpaid_sends_only_a_payment_link() {
    let h = harness();
    h.router.dispatch(text(10, "/start")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 1);
    let (chat, msg) = &sent[0];
    assert_eq!(*chat, 10);
    assert_eq!(msg.urls().len(), 1);
    assert!(msg.urls()[0].starts_with("https://rzp.io/l/test10_"));
    assert!(msg.text.contains(msg.urls()[0]));
    assert!(msg.callback_tokens().is_empty());
    assert_eq!(h.progress.streak(10), 0);
}

#[tokio::test]
async fn greeting_when_paid_shows_welcome_with_menu() {
    let h = harness();
    h.provider.pay(11);
    h.router.dispatch(text(11, "Hello")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 1);
    let msg = &sent[0].1;
    assert!(msg.text.contains("Asha"));
    assert_eq!(msg.callback_tokens().len(), 8);
    assert!(msg.callback_tokens().contains(&"CHALLENGE:OVERTHINKING"));
}

#[tokio::test]
async fn choosing_a_challenge_sends_intro_then_day_one() {
    let h = harness();
    h.provider.pay(12);
    h.router.dispatch(press(12, "CHALLENGE:STRESS")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.text.contains("Stress"));
    let day_one = &sent[1].1;
    let step = h.content.lookup(ChallengeId::Stress, 1);
    assert!(day_one.text.contains("Day 1 —"));
    assert!(day_one.text.contains(&step.title.replace('&', "&amp;")));
    assert!(
        day_one
            .callback_tokens()
            .contains(&"FLOW:NEXT:STRESS:2")
    );
    assert_eq!(h.progress.streak(12), 1);
}

#[tokio::test]
async fn last_day_offers_reminders_and_check_in() {
    let h = harness();
    h.provider.pay(13);
    h.router.dispatch(press(13, "FLOW:NEXT:STRESS:21")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 1);
    let tokens = sent[0].1.callback_tokens();
    assert!(tokens.contains(&"REMIND:START:STRESS:21"));
    assert!(tokens.contains(&"CHALLENGE:CHECKIN:STRESS"));
    assert!(tokens.contains(&"MENU:OPEN"));
    assert!(!tokens.iter().any(|t| t.starts_with("FLOW:NEXT")));
}

#[tokio::test]
async fn out_of_range_days_are_clamped() {
    let h = harness();
    h.provider.pay(14);
    h.router.dispatch(press(14, "FLOW:NEXT:ANXIETY:99")).await;
    h.router.dispatch(press(14, "FLOW:NEXT:ANXIETY:-3")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.text.contains("Day 21 —"));
    assert!(sent[1].1.text.contains("Day 1 —"));
}

#[tokio::test]
async fn same_press_renders_the_same_message() {
    let h = harness();
    h.provider.pay(15);
    h.router.dispatch(press(15, "FLOW:NEXT:BURNOUT:5")).await;
    h.router.dispatch(press(15, "FLOW:NEXT:BURNOUT:5")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, sent[1].1);
}

#[tokio::test]
async fn unpaid_chat_is_locked_out_of_everything_but_pay() {
    let h = harness();
    let locked = texts().access_locked;

    for event in [
        text(16, "/menu"),
        text(16, "/stop"),
        press(16, "CHALLENGE:STRESS"),
        press(16, "FLOW:NEXT:STRESS:2"),
        press(16, "REMIND:START:STRESS:21"),
        press(16, "MENU:OPEN"),
        press(16, "GARBAGE"),
    ] {
        h.router.dispatch(event).await;
    }
    let sent = h.sink.take();
    assert_eq!(sent.len(), 7);
    for (_, msg) in &sent {
        assert_eq!(msg.text, locked);
        assert!(msg.keyboard.is_empty());
    }
    assert!(h.store.get(16).is_none());

    h.router.dispatch(text(16, "/pay")).await;
    let sent = h.sink.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.urls().len(), 1);
}

#[tokio::test]
async fn payment_unlocks_on_the_next_message() {
    let h = harness();
    h.router.dispatch(text(17, "/menu")).await;
    h.provider.pay(17);
    h.router.dispatch(text(17, "/menu")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.keyboard.is_empty());
    assert_eq!(sent[1].1.callback_tokens().len(), 8);
}

#[tokio::test]
async fn provider_outage_yields_a_readable_failure() {
    let h = harness();
    *h.provider.down.lock().unwrap() = true;
    h.router.dispatch(text(18, "/pay")).await;
    h.router.dispatch(text(18, "/start")).await;

    let sent = h.sink.take();
    assert_eq!(sent.len(), 2);
    let pay_failed = texts().pay_failed;
    assert_eq!(sent[0].1.text, pay_failed);
    assert_eq!(sent[1].1.text, pay_failed);
}

#[tokio::test]
async fn malformed_tokens_get_a_hint() {
    let h = harness();
    h.provider.pay(19);
    let m = texts();
    let cases = [
        ("FLOW:NEXT:STRESS:abc", m.flow_failed.clone()),
        ("FLOW:NEXT:NOPE:2", m.flow_failed.clone()),
        ("CHALLENGE:NOPE", m.challenge_failed.clone()),
        ("REMIND:START:STRESS:0", m.remind_failed.clone()),
        ("REMIND:START:STRESS:x", m.remind_failed.clone()),
        ("CHALLENGE:CHECKIN:NOPE", m.unknown_callback.clone()),
        ("SOMETHING:ELSE", m.unknown_callback.clone()),
    ];
    for (data, _) in &cases {
        h.router.dispatch(press(19, data)).await;
    }
    let sent = h.sink.take();
    assert_eq!(sent.len(), cases.len());
    for ((data, expected), (_, msg)) in cases.iter().zip(&sent) {
        assert_eq!(&msg.text, expected, "reply to {}", data);
    }
    assert!(h.store.get(19).is_none());
}

#[tokio::test]
async fn free_text_gets_the_fallback_without_payment_check() {
    let h = harness();
    h.router.dispatch(text(20, "how are you?")).await;
    let sent = h.sink.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.text, texts().unknown_text);
}

#[tokio::test]
async fn reminders_start_and_stop() {
    let h = harness();
    h.provider.pay(21);
    h.router.dispatch(press(21, "REMIND:START:DEPRESSION:21")).await;

    let sub = h.store.get(21).unwrap();
    assert_eq!(sub.challenge, ChallengeId::Depression);
    assert_eq!(sub.total_days, 21);
    assert_eq!(sub.completed_days, 0);
    assert!(sub.last_sent_on.is_none());

    h.router.dispatch(text(21, "/stop")).await;
    assert!(h.store.get(21).is_none());

    let sent = h.sink.take();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.text.contains("21 days"));
    assert_eq!(sent[1].1.text, texts().stop_confirmed);
}

#[tokio::test]
async fn check_in_is_acknowledged() {
    let h = harness();
    h.provider.pay(22);
    h.router.dispatch(press(22, "CHALLENGE:CHECKIN:LONELINESS")).await;
    let sent = h.sink.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.text, texts().checkin_ack);
}

#[tokio::test]
async fn failed_delivery_is_contained() {
    let h = harness();
    h.provider.pay(23);
    h.sink.fail_for(23);
    // must not panic or propagate
    h.router.dispatch(press(23, "MENU:OPEN")).await;
    assert!(h.sink.take().is_empty());
}
