mod common;

use anyhow::Result;
use uuid::Uuid;

use tutorhub_api::services::{ContentError, ContentService, IdentityService, PostFilter};

#[tokio::test]
async fn comment_count_follows_the_comment_lifecycle() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let identity = IdentityService::new(pool.clone());
    let content = ContentService::new(pool);

    let author = common::unique("author");
    identity.create_user(&author, "hunter22", None).await?;

    let post = content
        .create_post(&author, Some("Maths".into()), None, "Quadratics", "Help!")
        .await?;
    assert_eq!(post.comment_count, 0);

    let first = content.create_comment(post.id, "Complete the square", &author).await?;
    content.create_comment(post.id, "Or use the formula", &author).await?;

    let reloaded = content.find_post(post.id).await?.expect("post should exist");
    assert_eq!(reloaded.comment_count, 2);
    assert_eq!(content.comments_for_post(post.id).await?.len(), 2);

    content.delete_comment(first.id).await?;
    let reloaded = content.find_post(post.id).await?.expect("post should exist");
    assert_eq!(reloaded.comment_count, 1);

    identity.delete_user(&author).await?;
    Ok(())
}

#[tokio::test]
async fn editing_a_post_never_touches_the_comment_count() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let identity = IdentityService::new(pool.clone());
    let content = ContentService::new(pool);

    let author = common::unique("editor");
    identity.create_user(&author, "hunter22", None).await?;

    let post = content
        .create_post(&author, None, None, "Original title", "Body")
        .await?;
    content.create_comment(post.id, "First!", &author).await?;

    content
        .update_post(post.id, &author, Some("Physics".into()), None, "New title", "Body")
        .await?;

    let reloaded = content.find_post(post.id).await?.expect("post should exist");
    assert_eq!(reloaded.title, "New title");
    assert_eq!(reloaded.category.as_deref(), Some("Physics"));
    assert_eq!(reloaded.comment_count, 1);

    identity.delete_user(&author).await?;
    Ok(())
}

#[tokio::test]
async fn deleting_a_post_takes_its_comments_with_it() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let identity = IdentityService::new(pool.clone());
    let content = ContentService::new(pool);

    let author = common::unique("cascade");
    identity.create_user(&author, "hunter22", None).await?;

    let post = content
        .create_post(&author, None, None, "Doomed", "Soon gone")
        .await?;
    let comment = content.create_comment(post.id, "Shame", &author).await?;

    content.delete_post(post.id).await?;

    assert!(content.find_post(post.id).await?.is_none());
    assert!(content.find_comment(comment.id).await?.is_none());

    identity.delete_user(&author).await?;
    Ok(())
}

#[tokio::test]
async fn racing_deletes_of_one_comment_settle_the_counter_once() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let identity = IdentityService::new(pool.clone());
    let content = ContentService::new(pool);

    let author = common::unique("racer");
    identity.create_user(&author, "hunter22", None).await?;

    let post = content
        .create_post(&author, None, None, "Contested", "x")
        .await?;
    let keeper = content.create_comment(post.id, "stays", &author).await?;
    let target = content.create_comment(post.id, "goes", &author).await?;

    // A double-submitted delete: exactly one attempt may win, and the
    // counter must move by exactly one.
    let (a, b) = tokio::join!(
        content.delete_comment(target.id),
        content.delete_comment(target.id),
    );
    let wins = [a, b].into_iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);

    let reloaded = content.find_post(post.id).await?.expect("post should exist");
    let live = content.comments_for_post(post.id).await?;
    assert_eq!(live.len(), 1);
    assert_eq!(reloaded.comment_count, 1);
    assert_eq!(live[0].id, keeper.id);

    identity.delete_user(&author).await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_comment_creation_keeps_the_count_exact() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let identity = IdentityService::new(pool.clone());
    let content = ContentService::new(pool);

    let author = common::unique("swarm");
    identity.create_user(&author, "hunter22", None).await?;

    let post = content
        .create_post(&author, None, None, "Busy thread", "x")
        .await?;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let content = content.clone();
            let author = author.clone();
            let post_id = post.id;
            tokio::spawn(async move {
                content
                    .create_comment(post_id, &format!("reply {}", i), &author)
                    .await
            })
        })
        .collect();

    let mut created = Vec::new();
    for task in tasks {
        created.push(task.await??);
    }

    let reloaded = content.find_post(post.id).await?.expect("post should exist");
    assert_eq!(reloaded.comment_count, 8);
    assert_eq!(content.comments_for_post(post.id).await?.len(), 8);

    // Interleaved concurrent deletions drain it back to zero.
    let tasks: Vec<_> = created
        .into_iter()
        .map(|comment| {
            let content = content.clone();
            tokio::spawn(async move { content.delete_comment(comment.id).await })
        })
        .collect();
    for task in tasks {
        task.await??;
    }

    let reloaded = content.find_post(post.id).await?.expect("post should exist");
    assert_eq!(reloaded.comment_count, 0);
    assert!(content.comments_for_post(post.id).await?.is_empty());

    identity.delete_user(&author).await?;
    Ok(())
}

#[tokio::test]
async fn commenting_on_a_missing_post_is_not_found() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let content = ContentService::new(pool);

    let result = content.create_comment(Uuid::new_v4(), "Hello?", "ghost").await;
    assert!(matches!(result, Err(ContentError::PostNotFound)));

    Ok(())
}

#[tokio::test]
async fn listing_filters_by_category_and_orders_newest_first() -> Result<()> {
    let Some(pool) = common::test_pool().await? else {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    };

    let identity = IdentityService::new(pool.clone());
    let content = ContentService::new(pool);

    let author = common::unique("lister");
    identity.create_user(&author, "hunter22", None).await?;

    // Unique category keeps this run isolated from concurrent tests.
    let category = common::unique("cat");
    let older = content
        .create_post(&author, Some(category.clone()), None, "Older", "a")
        .await?;
    let newer = content
        .create_post(&author, Some(category.clone()), None, "Newer", "b")
        .await?;

    let filter = PostFilter {
        category: Some(category),
        group_id: None,
    };
    let posts = content.list_posts(&filter).await?;

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, newer.id);
    assert_eq!(posts[1].id, older.id);
    assert!(posts[0].time_ago.is_some());

    identity.delete_user(&author).await?;
    Ok(())
}
