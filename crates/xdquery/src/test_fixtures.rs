//! Shared test schema: a small issue tracker.
//!
//! `Bug` extends `Issue`; `Project` stores its name under a renamed column.

use crate::{
    db::{
        Db,
        memory::MemoryStore,
        query::field::{Field, Link, LinkMany},
        registry::EntityTypeRegistry,
    },
    model::{entity::EntityModel, field::EntityFieldModel},
    traits::{EntityKind, Path},
    types::Record,
};

///
/// test_entity
///
/// Declare a record-backed entity type bound to a static model.
///

macro_rules! test_entity {
    ($name:ident, path = $path:expr, model = $model:expr $(,)?) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub struct $name(Record);

        impl Path for $name {
            const PATH: &'static str = $path;
        }

        impl EntityKind for $name {
            const MODEL: &'static EntityModel = &$model;

            fn from_record(record: Record) -> Self {
                Self(record)
            }

            fn record(&self) -> Record {
                self.0
            }
        }
    };
}

pub const ISSUE_MODEL: EntityModel = EntityModel {
    path: "tracker::Issue",
    entity_name: "Issue",
    supertype: None,
    fields: &[
        EntityFieldModel::property("title"),
        EntityFieldModel::property("priority"),
        EntityFieldModel::link("assignee", "User"),
        EntityFieldModel::link_many("watchers", "User"),
        EntityFieldModel::link("project", "Project"),
    ],
};

pub const BUG_MODEL: EntityModel = EntityModel {
    path: "tracker::Bug",
    entity_name: "Bug",
    supertype: Some("Issue"),
    fields: &[EntityFieldModel::property("severity")],
};

pub const USER_MODEL: EntityModel = EntityModel {
    path: "tracker::User",
    entity_name: "User",
    supertype: None,
    fields: &[EntityFieldModel::property("name")],
};

pub const PROJECT_MODEL: EntityModel = EntityModel {
    path: "tracker::Project",
    entity_name: "Project",
    supertype: None,
    fields: &[EntityFieldModel::property("name").stored_as("project_name")],
};

test_entity!(Issue, path = "tracker::Issue", model = ISSUE_MODEL);
test_entity!(Bug, path = "tracker::Bug", model = BUG_MODEL);
test_entity!(User, path = "tracker::User", model = USER_MODEL);
test_entity!(Project, path = "tracker::Project", model = PROJECT_MODEL);

impl Issue {
    pub const TITLE: Field<Self, String> = Field::new("title");
    pub const PRIORITY: Field<Self, i64> = Field::new("priority");
    pub const ASSIGNEE: Link<Self, User> = Link::new("assignee");
    pub const WATCHERS: LinkMany<Self, User> = LinkMany::new("watchers");
    pub const PROJECT: Link<Self, Project> = Link::new("project");
}

impl Bug {
    pub const TITLE: Field<Self, String> = Field::new("title");
    pub const SEVERITY: Field<Self, i64> = Field::new("severity");
}

impl User {
    pub const NAME: Field<Self, String> = Field::new("name");
}

impl Project {
    pub const NAME: Field<Self, String> = Field::new("name");
}

pub fn registry() -> EntityTypeRegistry {
    EntityTypeRegistry::new()
        .with::<Issue>()
        .and_then(EntityTypeRegistry::with::<Bug>)
        .and_then(EntityTypeRegistry::with::<User>)
        .and_then(EntityTypeRegistry::with::<Project>)
        .expect("fixture registry")
}

///
/// Tracker
///
/// Store plus `Db` over the fixture schema, with creation helpers.
///

pub struct Tracker {
    pub store: MemoryStore,
    pub db: Db,
}

impl Tracker {
    pub fn new() -> Self {
        let store = MemoryStore::new(registry());
        let db = store.db();

        Self { store, db }
    }

    pub fn issue(&self, title: &str, priority: Option<i64>) -> Issue {
        let issue = self.store.create::<Issue>().expect("create issue");
        self.store
            .set(&issue, Issue::TITLE, title.to_string())
            .expect("set title");
        if let Some(priority) = priority {
            self.store
                .set(&issue, Issue::PRIORITY, priority)
                .expect("set priority");
        }

        issue
    }

    pub fn bug(&self, title: &str) -> Bug {
        let bug = self.store.create::<Bug>().expect("create bug");
        self.store
            .set(&bug, Bug::TITLE, title.to_string())
            .expect("set title");

        bug
    }

    pub fn user(&self, name: &str) -> User {
        let user = self.store.create::<User>().expect("create user");
        self.store
            .set(&user, User::NAME, name.to_string())
            .expect("set name");

        user
    }

    pub fn project(&self, name: &str) -> Project {
        let project = self.store.create::<Project>().expect("create project");
        self.store
            .set(&project, Project::NAME, name.to_string())
            .expect("set name");

        project
    }

    /// Upcast a bug to its supertype view.
    pub fn as_issue(bug: Bug) -> Issue {
        Issue::from_record(bug.record())
    }
}
