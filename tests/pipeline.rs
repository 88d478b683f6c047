mod common;

use futures::StreamExt;
use std::sync::Arc;

use common::{harness, FAQ_CSV};
use docchat::domain::ports::ConversationStore;
use docchat::domain::{DomainError, MessageRole};

#[tokio::test]
async fn test_refund_question_uses_retrieved_context_and_is_stored() {
    let h = harness("Refunds are issued within 30 days.");
    assert!(h.ingest_faq().await > 0);

    let chunks = h
        .state
        .retriever
        .retrieve("What is the refund policy?")
        .await
        .unwrap();
    assert!(chunks.len() <= 3);
    assert!(chunks[0].content.contains("refund policy"));

    h.state
        .rag
        .answer("What is the refund policy?", "t1")
        .await
        .unwrap();

    let request = &h.llm.requests()[0];
    assert_eq!(request.system, common::SYSTEM_PROMPT);
    assert!(request.prompt.contains("Refunds are issued within 30 days of purchase"));

    let log = h.conversations.load("t1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, MessageRole::User);
    assert_eq!(log[0].content, "What is the refund policy?");
    assert_eq!(log[1].role, MessageRole::Assistant);
    assert!(!log[1].content.is_empty());
}

#[tokio::test]
async fn test_n_answers_store_2n_messages_in_order() {
    let h = harness("ok");
    let questions = ["first?", "second?", "third?"];

    for q in questions {
        h.state.rag.answer(q, "t-order").await.unwrap();
    }

    let log = h.conversations.load("t-order").await.unwrap();
    assert_eq!(log.len(), 2 * questions.len());
    for (i, q) in questions.iter().enumerate() {
        assert_eq!(log[2 * i].content, *q);
        assert_eq!(log[2 * i].role, MessageRole::User);
        assert_eq!(log[2 * i + 1].role, MessageRole::Assistant);
    }
}

#[tokio::test]
async fn test_unknown_thread_is_created_by_first_answer() {
    let h = harness("ok");

    assert!(h.state.rag.history("brand-new").await.unwrap().is_empty());
    h.state.rag.answer("hello?", "brand-new").await.unwrap();

    assert_eq!(h.state.rag.history("brand-new").await.unwrap().len(), 2);
    assert!(h
        .state
        .rag
        .threads()
        .await
        .unwrap()
        .contains(&"brand-new".to_string()));
}

#[tokio::test]
async fn test_unsupported_upload_leaves_index_unchanged() {
    let h = harness("ok");
    h.ingest_faq().await;
    let before = h.state.index.len().await.unwrap();

    let err = h
        .state
        .documents
        .ingest_upload("notes.txt", b"refund policy")
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::UnsupportedFileType(_)));
    assert_eq!(h.state.index.len().await.unwrap(), before);
}

#[tokio::test]
async fn test_ingesting_twice_never_shrinks_the_index() {
    let h = harness("ok");

    let first = h.ingest_faq().await;
    let after_first = h.state.index.len().await.unwrap();
    let second = h.ingest_faq().await;

    assert_eq!(first, second);
    assert!(h.state.index.len().await.unwrap() >= after_first);
    assert_eq!(first, FAQ_CSV.lines().count() - 1);
}

#[tokio::test]
async fn test_streamed_answer_matches_blocking_answer() {
    let h = harness("Orders ship in five business days.");
    h.ingest_faq().await;

    let blocking = h
        .state
        .rag
        .answer("How long is shipping?", "blocking")
        .await
        .unwrap();
    let streamed = h
        .state
        .rag
        .answer_stream("How long is shipping?", "streaming")
        .await
        .unwrap()
        .collect_text()
        .await
        .unwrap();

    assert_eq!(streamed, blocking.content);
    let log = h.conversations.load("streaming").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].content, streamed);
}

#[tokio::test]
async fn test_dropping_a_stream_mid_way_persists_nothing() {
    let h = harness("one two three four five");

    let mut stream = h
        .state
        .rag
        .answer_stream("count please", "cancelled")
        .await
        .unwrap();
    stream.next().await.unwrap().unwrap();
    stream.next().await.unwrap().unwrap();
    drop(stream);

    assert!(h.conversations.load("cancelled").await.unwrap().is_empty());
    assert!(h.state.rag.threads().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_generation_persists_nothing() {
    let h = harness("unused");
    h.llm.set_failing(true);

    let err = h.state.rag.answer("anything?", "t-fail").await.unwrap_err();

    assert!(matches!(err, DomainError::Generation(_)));
    assert!(h.conversations.load("t-fail").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_answers_on_one_thread_do_not_interleave() {
    let h = harness("ok");
    let rag = h.state.rag.clone();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let rag = Arc::clone(&rag);
            let thread = if i % 2 == 0 { "shared" } else { "other" };
            tokio::spawn(async move { rag.answer(&format!("q{i}"), thread).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let shared = h.conversations.load("shared").await.unwrap();
    assert_eq!(shared.len(), 16);
    for pair in shared.chunks(2) {
        assert_eq!(pair[0].role, MessageRole::User);
        assert_eq!(pair[1].role, MessageRole::Assistant);
    }
    assert_eq!(h.conversations.load("other").await.unwrap().len(), 16);
    assert_eq!(
        h.state.rag.threads().await.unwrap(),
        vec!["other".to_string(), "shared".to_string()]
    );
}
