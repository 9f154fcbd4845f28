use featurecost::db::Database;
use featurecost::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn create_test_project(db: &Database) -> Project {
    db.create_project(CreateProjectInput {
        name: "Test Project".to_string(),
        description: None,
        document: None,
    })
    .expect("Failed to create project")
}

fn sample_document() -> EstimateProject {
    let mut document = EstimateProject {
        platforms: vec![Platform::Web, Platform::Ios],
        discount: 0.95,
        ..EstimateProject::default()
    };
    let module = document
        .tree
        .insert_node(None, FeatureNode::new("Billing"))
        .expect("Failed to insert module");
    document
        .tree
        .insert_node(Some(module), FeatureNode::new("Invoices").with_complexity(Tier::High))
        .expect("Failed to insert menu");
    document.headcounts.set(Role::Backend, 2);
    document
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "projects" {
        describe "create_project" {
            it "starts from an empty default document" {
                let project = create_test_project(&db);

                assert_eq!(project.name, "Test Project");
                assert!(project.document.tree.is_empty());
                assert_eq!(project.document.discount, 1.0);
            }

            it "stores a supplied document" {
                let project = db.create_project(CreateProjectInput {
                    name: "Billing".to_string(),
                    description: Some("Invoice portal".to_string()),
                    document: Some(sample_document()),
                }).expect("Failed to create project");

                let found = db.get_project(project.id).expect("Query failed").expect("Project missing");
                assert_eq!(found.description, Some("Invoice portal".to_string()));
                assert_eq!(found.document, project.document);
            }
        }

        describe "get_project" {
            it "returns None for non-existent project" {
                let result = db.get_project(Uuid::new_v4()).expect("Query failed");
                assert!(result.is_none());
            }
        }

        describe "get_all_projects" {
            it "lists projects by name" {
                for name in ["Zeta", "Alpha", "Mid"] {
                    db.create_project(CreateProjectInput {
                        name: name.to_string(),
                        description: None,
                        document: None,
                    }).expect("Failed to create project");
                }

                let names: Vec<String> = db
                    .get_all_projects()
                    .expect("Query failed")
                    .into_iter()
                    .map(|p| p.name)
                    .collect();
                assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
            }
        }

        describe "update_project" {
            it "updates only the given metadata" {
                let project = db.create_project(CreateProjectInput {
                    name: "Original".to_string(),
                    description: Some("Keep me".to_string()),
                    document: Some(sample_document()),
                }).expect("Failed to create project");

                let updated = db.update_project(project.id, UpdateProjectInput {
                    name: Some("Renamed".to_string()),
                    description: None,
                }).expect("Update failed").expect("Project missing");

                assert_eq!(updated.name, "Renamed");
                assert_eq!(updated.description, Some("Keep me".to_string()));
                assert_eq!(updated.document, project.document);
            }

            it "returns None for non-existent project" {
                let result = db.update_project(Uuid::new_v4(), UpdateProjectInput {
                    name: Some("Nobody".to_string()),
                    description: None,
                }).expect("Update failed");
                assert!(result.is_none());
            }
        }

        describe "save_document" {
            it "replaces the stored document" {
                let project = create_test_project(&db);
                let document = sample_document();

                assert!(db.save_document(project.id, &document).expect("Save failed"));

                let found = db.get_project(project.id).expect("Query failed").expect("Project missing");
                assert_eq!(found.document, document);
                assert!(found.updated_at >= project.updated_at);
            }

            it "reports a missing project" {
                let saved = db.save_document(Uuid::new_v4(), &sample_document()).expect("Save failed");
                assert!(!saved);
            }
        }

        describe "delete_project" {
            it "removes the project" {
                let project = create_test_project(&db);

                assert!(db.delete_project(project.id).expect("Delete failed"));
                assert!(db.get_project(project.id).expect("Query failed").is_none());
                assert!(!db.delete_project(project.id).expect("Delete failed"));
            }
        }
    }

    describe "file databases" {
        it "persists across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("store").join("featurecost.db");

            let id = {
                let db = Database::open(path.clone()).expect("Failed to open database");
                db.migrate().expect("Failed to run migrations");
                create_test_project(&db).id
            };

            let reopened = Database::open(path).expect("Failed to reopen database");
            reopened.migrate().expect("Failed to run migrations");
            assert!(reopened.get_project(id).expect("Query failed").is_some());
        }
    }
}
