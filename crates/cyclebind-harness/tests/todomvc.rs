//! TodoMVC driven through the test host the way a user would drive it.

use cyclebind_harness::fixtures::{App, FILTER_ACTIVE, FILTER_COMPLETED, TodoItem, Todos};
use cyclebind_harness::strategies::{TodoEdit, arb_todo_script};
use cyclebind_harness::{EventLog, TestHost, items_of};
use cyclebind_runtime::{ChangeKind, Value, ViewModel};
use proptest::prelude::*;

const ENTER: i64 = 13;
const ESC: i64 = 27;

fn completed_flags(todos: &ViewModel) -> Vec<bool> {
    items_of(todos, "todos")
        .iter()
        .map(|row| row.property("is_completed").is_truthy())
        .collect()
}

fn titles(todos: &ViewModel) -> Vec<String> {
    items_of(todos, "todos")
        .iter()
        .map(|row| row.property("title").as_str().unwrap_or_default().to_owned())
        .collect()
}

fn mounted_list(host: &TestHost, rows: &[(&str, bool)]) -> ViewModel {
    let seeded: Vec<Value> = rows
        .iter()
        .map(|(title, done)| TodoItem::create(title, *done).into())
        .collect();
    let todos = Todos::create().with_property("todos", Value::list(seeded));
    host.bind(&todos).expect("mount list");
    host.bind_items(&todos, "todos").expect("mount rows");
    todos
}

fn add(host: &TestHost, todos: &ViewModel, title: &str) {
    host.type_into(todos, "new_todo_title", title);
    host.click(todos, "add_todo");
    let rows = items_of(todos, "todos");
    if let Some(row) = rows.last().filter(|row| !row.is_mounted()) {
        host.bind(row).expect("mount new row");
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn adding_trims_the_title_and_clears_the_field() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[]);
    assert_eq!(todos.property("remaining"), Value::Int(0));

    add(&host, &todos, "  Buy milk ");

    assert_eq!(titles(&todos), vec!["Buy milk"]);
    assert_eq!(todos.property("new_todo_title"), Value::str(""));
    assert_eq!(todos.property("remaining"), Value::Int(1));
}

#[test]
fn blank_titles_are_ignored() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[]);
    host.type_into(&todos, "new_todo_title", "   ");
    host.click(&todos, "add_todo");
    assert!(items_of(&todos, "todos").is_empty());
}

#[test]
fn toggle_all_completes_then_reopens_everything() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", false), ("b", true), ("c", false)]);
    assert_eq!(todos.property("remaining"), Value::Int(2));

    host.click(&todos, "toggle_all");
    assert_eq!(completed_flags(&todos), vec![true, true, true]);
    assert_eq!(todos.property("remaining"), Value::Int(0));

    host.click(&todos, "toggle_all");
    assert_eq!(completed_flags(&todos), vec![false, false, false]);
    assert_eq!(todos.property("remaining"), Value::Int(3));
}

#[test]
fn toggle_all_reports_one_bulk_operation() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", false), ("b", true), ("c", false)]);
    let rows = EventLog::record(&todos.change_stream());

    host.click(&todos, "toggle_all");

    let bulk: Vec<_> = rows
        .events()
        .into_iter()
        .filter(|event| event.kind == ChangeKind::BulkOperation)
        .collect();
    assert_eq!(bulk.len(), 1);
    assert_eq!(bulk[0].value, Value::Int(2));
    assert!(bulk[0].is_for("todos"));
}

#[test]
fn toggling_a_row_updates_the_count() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", false), ("b", false)]);
    let first = items_of(&todos, "todos").remove(0);

    host.click(&first, "toggle");
    assert!(first.property("is_completed").is_truthy());
    assert_eq!(todos.property("remaining"), Value::Int(1));

    host.click(&first, "toggle");
    assert_eq!(todos.property("remaining"), Value::Int(2));
}

#[test]
fn destroying_a_row_goes_through_the_parent() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", false), ("b", false)]);
    let first = items_of(&todos, "todos").remove(0);

    host.click(&first, "destroy");

    assert_eq!(titles(&todos), vec!["b"]);
    assert_eq!(todos.property("remaining"), Value::Int(1));
    assert_eq!(first.pending_post_unbind_hooks(), 1);

    host.unbind(&first);
    assert_eq!(first.pending_post_unbind_hooks(), 0);
    assert_eq!(first.changes().observer_count(), 0);
}

#[test]
fn finishing_an_edit_with_an_empty_title_destroys_the_row() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", false), ("b", false)]);
    let second = items_of(&todos, "todos").remove(1);

    host.click(&second, "start_edit");
    assert_eq!(second.property("is_editing"), Value::Bool(true));
    host.type_into(&second, "title", "  ");
    host.invoke(&second, "key_up", [ENTER]);

    assert_eq!(titles(&todos), vec!["a"]);
    assert_eq!(second.property("is_editing"), Value::Bool(false));
}

#[test]
fn escape_cancels_an_edit_without_destroying() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", false)]);
    let row = items_of(&todos, "todos").remove(0);

    host.click(&row, "start_edit");
    host.type_into(&row, "title", "");
    host.invoke(&row, "key_up", [ESC]);

    assert_eq!(row.property("is_editing"), Value::Bool(false));
    assert_eq!(items_of(&todos, "todos").len(), 1);
}

#[test]
fn clear_completed_removes_only_completed_rows() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", true), ("b", false), ("c", true)]);

    host.click(&todos, "clear_completed");

    assert_eq!(titles(&todos), vec!["b"]);
    assert_eq!(todos.property("remaining"), Value::Int(1));
}

#[test]
fn filter_selects_visible_rows() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[("a", true), ("b", false)]);
    assert_eq!(Todos::visible(&todos).len(), 2);

    host.invoke(&todos, "filter", [FILTER_ACTIVE]);
    assert_eq!(todos.property("current_filter"), Value::str(FILTER_ACTIVE));
    let visible = Todos::visible(&todos);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].property("title"), Value::str("b"));

    host.invoke(&todos, "filter", [FILTER_COMPLETED]);
    assert_eq!(Todos::visible(&todos)[0].property("title"), Value::str("a"));

    host.invoke(&todos, "filter", ["bogus"]);
    assert_eq!(todos.property("current_filter"), Value::str(FILTER_COMPLETED));
}

#[test]
fn refresh_signals_are_throttled_by_the_host_clock() {
    let host = TestHost::new();
    let todos = mounted_list(&host, &[]);
    let name = todos
        .property("refresh")
        .as_str()
        .expect("signal name stored")
        .to_owned();

    add(&host, &todos, "one");
    add(&host, &todos, "two");
    assert_eq!(host.signals().count_of(&name), 1);

    host.clock().advance_ms(100);
    add(&host, &todos, "three");
    assert_eq!(host.signals().count_of(&name), 2);
}

#[test]
fn the_app_summarizes_its_nested_list() {
    let host = TestHost::new();
    let app = App::create();
    let todos = App::todos(&app).expect("nested list");
    host.bind(&app).expect("mount app");
    host.bind(&todos).expect("mount list");
    assert_eq!(app.property("summary"), Value::str("0 items left"));

    add(&host, &todos, "one");
    assert_eq!(app.property("summary"), Value::str("1 item left"));
    add(&host, &todos, "two");
    assert_eq!(app.property("summary"), Value::str("2 items left"));
}

// ---------------------------------------------------------------------------
// Scripted sessions against a plain model
// ---------------------------------------------------------------------------

struct Session {
    host: TestHost,
    todos: ViewModel,
    model: Vec<(String, bool)>,
    gone: Vec<ViewModel>,
}

impl Session {
    fn new() -> Self {
        let host = TestHost::new();
        let todos = mounted_list(&host, &[]);
        Self {
            host,
            todos,
            model: Vec::new(),
            gone: Vec::new(),
        }
    }

    fn rows(&self) -> Vec<ViewModel> {
        items_of(&self.todos, "todos")
    }

    /// Unbind rows that left the list, as a host would when it stops
    /// rendering them.
    fn unbind_removed(&mut self, before: &[ViewModel]) {
        let after = self.rows();
        for row in before {
            if !after.iter().any(|r| r.ptr_eq(row)) {
                self.host.unbind(row);
                self.gone.push(row.clone());
            }
        }
    }

    fn apply(&mut self, edit: &TodoEdit) {
        let before = self.rows();
        let pick = |i: usize| (!before.is_empty()).then(|| i % before.len());
        match edit {
            TodoEdit::Add(title) => {
                add(&self.host, &self.todos, title);
                self.model.push((title.trim().to_owned(), false));
            }
            TodoEdit::AddBlank => {
                self.host.type_into(&self.todos, "new_todo_title", " ");
                self.host.click(&self.todos, "add_todo");
            }
            TodoEdit::Toggle(i) => {
                if let Some(i) = pick(*i) {
                    self.host.click(&before[i], "toggle");
                    self.model[i].1 = !self.model[i].1;
                }
            }
            TodoEdit::Destroy(i) => {
                if let Some(i) = pick(*i) {
                    self.host.click(&before[i], "destroy");
                    self.model.remove(i);
                }
            }
            TodoEdit::EmptyTitle(i) => {
                if let Some(i) = pick(*i) {
                    self.host.click(&before[i], "start_edit");
                    self.host.type_into(&before[i], "title", "");
                    self.host.invoke(&before[i], "key_up", [ENTER]);
                    self.model.remove(i);
                }
            }
            TodoEdit::ToggleAll => {
                self.host.click(&self.todos, "toggle_all");
                let any_open = self.model.iter().any(|(_, done)| !done);
                for row in &mut self.model {
                    row.1 = any_open;
                }
            }
            TodoEdit::ClearCompleted => {
                self.host.click(&self.todos, "clear_completed");
                self.model.retain(|(_, done)| !done);
            }
        }
        self.unbind_removed(&before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sessions_match_a_plain_list(script in arb_todo_script(30)) {
        let mut session = Session::new();
        for edit in &script {
            session.apply(edit);

            let expected_titles: Vec<String> =
                session.model.iter().map(|(t, _)| t.clone()).collect();
            let expected_flags: Vec<bool> = session.model.iter().map(|(_, d)| *d).collect();
            prop_assert_eq!(titles(&session.todos), expected_titles, "after {:?}", edit);
            prop_assert_eq!(completed_flags(&session.todos), expected_flags);
            let open = session.model.iter().filter(|(_, d)| !d).count();
            prop_assert_eq!(session.todos.property("remaining"), Value::from(open));
        }
        for row in &session.gone {
            prop_assert!(!row.is_running());
            prop_assert_eq!(row.pending_post_unbind_hooks(), 0);
            prop_assert_eq!(row.changes().observer_count(), 0);
        }
    }
}
