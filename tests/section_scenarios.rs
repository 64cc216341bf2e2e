//! Board scenarios driven through the public API.

use section_view::model::{Post, PostId, Thread, ThreadAttributes, ThreadHandle};
use section_view::store::{OwnPosts, PostRegistry, ThreadRegistry};
use section_view::view::{Board, Page, SectionView, SettingsProvider, ViewContext, ViewMode};
use std::rc::Rc;

struct Limit(i64);

impl SettingsProvider for Limit {
    fn abbreviation_limit(&self) -> i64 {
        self.0
    }
}

fn id(n: u64) -> PostId {
    PostId::new(n).expect("non-zero id")
}

struct BoardPage {
    board: Board,
    posts: Rc<PostRegistry>,
    threads: ThreadRegistry,
    ctx: ViewContext,
}

fn board_page(limit: i64) -> BoardPage {
    let posts = Rc::new(PostRegistry::new());
    let page = Rc::new(Page::new("board", Rc::new(OwnPosts::new())));
    let ctx = ViewContext::new(ViewMode::Board, posts.clone(), page, Rc::new(Limit(limit)));
    BoardPage {
        board: Board::new(),
        posts,
        threads: ThreadRegistry::new(),
        ctx,
    }
}

impl BoardPage {
    fn open(&self, attrs: ThreadAttributes) -> (ThreadHandle, SectionView) {
        let thread = Thread::new(attrs);
        let view = SectionView::mount(
            Rc::clone(&thread),
            self.board.host_for(thread.id()),
            self.ctx.clone(),
        )
        .expect("default markup is valid");
        self.threads.add(Rc::clone(&thread));
        (thread, view)
    }
}

/// Replies r1..r10 on thread 100; posts r1..r5 and r7..r11 registered.
fn ten_replies(page: &BoardPage) -> (ThreadHandle, SectionView) {
    for n in (1..=5).chain(7..=11) {
        page.posts.insert(Post::new(id(n), false));
    }
    page.open(
        ThreadAttributes::new(id(100))
            .with_body("op")
            .with_replies((1..=10).map(id)),
    )
}

#[test]
fn reply_from_another_user_keeps_five_newest() {
    let page = board_page(5);
    let (thread, _view) = ten_replies(&page);

    thread.append_reply(id(11), false);

    assert_eq!(thread.replies(), (7..=11).map(id).collect::<Vec<_>>());
    assert_eq!(thread.omit(), 5);
    for n in 1..=5 {
        assert!(!page.posts.contains(id(n)), "r{n} should be deregistered");
    }
    insta::assert_snapshot!(page.board.outline(), @r#"
    div#threads
      aside.act
        "New thread"
      section#p100
        header
          a.quote
            "No.100"
        blockquote
          "op"
        span.omit
          "5 replies omitted"
      aside.act.posting
        a
          "Reply"
      hr
    "#);
}

#[test]
fn reply_from_own_composer_keeps_four_newest() {
    let page = board_page(5);
    let (thread, view) = ten_replies(&page);

    thread.append_reply(id(11), true);

    assert_eq!(thread.replies(), (8..=11).map(id).collect::<Vec<_>>());
    assert_eq!(thread.omit(), 6);
    let indicator = view.omit_indicator().expect("indicator rendered");
    assert_eq!(
        page.board.doc().borrow().text_content(indicator),
        "6 replies omitted"
    );
}

#[test]
fn bump_moves_section_without_changing_it() {
    let page = board_page(5);
    let (first, first_view) = page.open(ThreadAttributes::new(id(1)).with_subject("first"));
    let (_second, _second_view) = page.open(ThreadAttributes::new(id(2)).with_subject("second"));
    let doc = page.board.doc();
    let before = doc.borrow().outline(first_view.node());
    assert_eq!(page.board.thread_order(), vec![id(2), id(1)]);

    first.bump();

    assert_eq!(page.board.thread_order(), vec![id(1), id(2)]);
    assert_eq!(page.board.find_section(id(1)), Some(first_view.node()));
    assert_eq!(doc.borrow().outline(first_view.node()), before);
}

#[test]
fn hide_keeps_section_and_separator_in_step() {
    let page = board_page(5);
    let (thread, view) = page.open(ThreadAttributes::new(id(1)));
    let doc = page.board.doc();
    let separator = view.separator().expect("separator rendered");

    for hide in [true, false, true] {
        thread.set_hidden(hide);
        let doc = doc.borrow();
        assert_eq!(doc.is_hidden(view.node()), hide);
        assert_eq!(doc.is_hidden(separator), hide);
    }
}

#[test]
fn removing_twice_is_harmless() {
    let page = board_page(5);
    let (_thread, view) = page.open(ThreadAttributes::new(id(1)));

    page.threads.remove(id(1));
    view.remove();
    page.threads.remove(id(1));

    assert!(view.is_removed());
    insta::assert_snapshot!(page.board.outline(), @r#"
    div#threads
      aside.act
        "New thread"
    "#);
}

#[test]
fn lock_then_unlock_restores_markup() {
    let page = board_page(5);
    let (thread, view) = page.open(ThreadAttributes::new(id(1)).with_body("x"));
    let doc = page.board.doc();
    let before = doc.borrow().outline(view.node());

    thread.set_locked(true);
    assert!(doc.borrow().outline(view.node()).starts_with("section#p1.locked"));

    thread.set_locked(false);
    assert_eq!(doc.borrow().outline(view.node()), before);
}
