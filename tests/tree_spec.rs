use featurecost::models::*;
use featurecost::tree::{FeatureTree, HistoryManager, TreeError};
use speculate2::speculate;
use uuid::Uuid;

fn names(nodes: &[std::sync::Arc<FeatureNode>]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

fn button_names(tree: &FeatureTree, id: Uuid) -> Vec<String> {
    tree.find(id)
        .expect("node should exist")
        .buttons
        .iter()
        .map(|b| b.name.clone())
        .collect()
}

speculate! {
    before {
        let mut tree = FeatureTree::new();
        let crm = tree.insert_node(None, FeatureNode::new("CRM")).expect("insert module");
        let contacts = tree.insert_node(Some(crm), FeatureNode::new("Contacts")).expect("insert submodule");
        let list = tree.insert_node(Some(contacts), FeatureNode::new("List")).expect("insert menu");
        let detail = tree.insert_node(Some(contacts), FeatureNode::new("Detail")).expect("insert menu");
        let reports = tree.insert_node(Some(crm), FeatureNode::new("Reports")).expect("insert menu");
    }

    describe "insert_node" {
        it "appends under the parent and links back to it" {
            assert_eq!(names(&tree.find(contacts).unwrap().children), vec!["List", "Detail"]);
            assert_eq!(tree.find(list).unwrap().parent_id, Some(contacts));
            assert_eq!(tree.find(crm).unwrap().parent_id, None);
        }

        it "rejects an unknown parent" {
            let ghost = Uuid::new_v4();
            let err = tree.insert_node(Some(ghost), FeatureNode::new("Orphan")).unwrap_err();
            assert_eq!(err, TreeError::NodeNotFound(ghost));
        }

        it "rejects an id already in the tree" {
            let before = tree.clone();
            let mut twin = FeatureNode::new("Twin");
            twin.id = list;

            assert_eq!(tree.insert_node(None, twin), Err(TreeError::DuplicateId(list)));
            assert_eq!(tree, before);

            tree.delete_node(list).unwrap();
            assert!(!tree.contains(list));
        }

        it "rejects a subtree reusing an existing id" {
            let mut nested = FeatureNode::new("Child");
            nested.id = reports;
            let parent = FeatureNode::new("Parent").with_child(nested);

            assert_eq!(tree.insert_node(None, parent), Err(TreeError::DuplicateId(reports)));
        }

        it "rejects a parent that already has buttons" {
            tree.add_buttons(list, &ButtonTemplate::standard(Some(Tier::VeryHigh))).unwrap();

            assert_eq!(
                tree.insert_node(Some(list), FeatureNode::new("Nested")),
                Err(TreeError::HasButtons(list))
            );
            assert_eq!(tree.kind_of(list), Some(NodeKind::Menu));
        }
    }

    describe "node kinds" {
        it "derives kinds from position" {
            assert_eq!(tree.kind_of(crm), Some(NodeKind::Module));
            assert_eq!(tree.kind_of(contacts), Some(NodeKind::Submodule));
            assert_eq!(tree.kind_of(list), Some(NodeKind::Menu));
            assert_eq!(tree.kind_of(reports), Some(NodeKind::Menu));
        }

        it "reclassifies a menu once it gains children" {
            tree.insert_node(Some(reports), FeatureNode::new("Monthly")).unwrap();
            assert_eq!(tree.kind_of(reports), Some(NodeKind::Submodule));
        }
    }

    describe "move_node" {
        it "reorders siblings" {
            tree.move_node(detail, Some(contacts), 0).unwrap();
            assert_eq!(names(&tree.find(contacts).unwrap().children), vec!["Detail", "List"]);
        }

        it "reparents and clamps the index" {
            tree.move_node(list, Some(crm), 99).unwrap();
            assert_eq!(names(&tree.find(crm).unwrap().children), vec!["Contacts", "Reports", "List"]);
            assert_eq!(tree.find(list).unwrap().parent_id, Some(crm));
            assert_eq!(tree.depth_of(list), Some(1));
        }

        it "promotes a node to the top level" {
            tree.move_node(reports, None, 0).unwrap();
            assert_eq!(names(tree.roots()), vec!["Reports", "CRM"]);
            assert_eq!(tree.find(reports).unwrap().parent_id, None);
        }

        it "rejects moving a node under its own descendant" {
            let before = tree.clone();
            let err = tree.move_node(crm, Some(list), 0).unwrap_err();

            assert_eq!(err, TreeError::Cycle { node: crm, target: list });
            assert_eq!(tree, before);
        }

        it "rejects moving under a menu with buttons" {
            tree.add_buttons(detail, &[ButtonTemplate::new("Create")]).unwrap();
            let before = tree.clone();

            assert_eq!(tree.move_node(reports, Some(detail), 0), Err(TreeError::HasButtons(detail)));
            assert_eq!(tree, before);
        }

        it "rejects moving a node under itself" {
            assert!(matches!(
                tree.move_node(contacts, Some(contacts), 0),
                Err(TreeError::Cycle { .. })
            ));
        }
    }

    describe "delete_node" {
        it "removes the whole subtree" {
            let menu = tree.find(list).unwrap().id;
            tree.add_buttons(menu, &[ButtonTemplate::new("Create")]).unwrap();
            let button = tree.find(list).unwrap().buttons[0].id;

            let removed = tree.delete_node(contacts).unwrap();

            assert!(removed.contains(&contacts));
            assert!(removed.contains(&list));
            assert!(removed.contains(&detail));
            assert!(removed.contains(&button));
            assert!(!tree.contains(list));
            assert_eq!(names(&tree.find(crm).unwrap().children), vec!["Reports"]);
        }

        it "fails on an unknown id" {
            assert!(matches!(tree.delete_node(Uuid::new_v4()), Err(TreeError::NodeNotFound(_))));
        }
    }

    describe "update_field" {
        it "changes one field" {
            tree.update_field(list, NodeField::Complexity(Some(Tier::High))).unwrap();
            tree.update_field(list, NodeField::Remark("paged".to_string())).unwrap();

            let node = tree.find(list).unwrap();
            assert_eq!(node.complexity, Some(Tier::High));
            assert_eq!(node.remark, "paged");
            assert_eq!(node.name, "List");
        }
    }

    describe "buttons" {
        it "keeps canonical order regardless of insertion order" {
            tree.add_buttons(list, &[ButtonTemplate::new("Export"), ButtonTemplate::new("Create")])
                .unwrap();
            tree.add_buttons(list, &[ButtonTemplate::new("Approve"), ButtonTemplate::new("Delete")])
                .unwrap();

            assert_eq!(button_names(&tree, list), vec!["Create", "Delete", "Export", "Approve"]);
        }

        it "skips names the menu already has" {
            tree.add_buttons(list, &ButtonTemplate::standard(None)).unwrap();
            let added = tree.add_buttons(list, &ButtonTemplate::standard(Some(Tier::High))).unwrap();

            assert_eq!(added, 0);
            assert_eq!(tree.find(list).unwrap().buttons.len(), 6);
        }

        it "only attaches to menus" {
            assert_eq!(
                tree.add_buttons(contacts, &[ButtonTemplate::new("Create")]),
                Err(TreeError::NotAMenu(contacts))
            );
        }

        it "updates and removes a single button" {
            tree.add_buttons(detail, &ButtonTemplate::standard(None)[..2]).unwrap();
            let edit = tree.find(detail).unwrap().buttons[1].id;

            tree.update_button(detail, edit, NodeField::Complexity(Some(Tier::Low))).unwrap();
            assert_eq!(tree.find(detail).unwrap().buttons[1].complexity, Some(Tier::Low));

            let removed = tree.remove_button(detail, edit).unwrap();
            assert_eq!(removed.name, "Edit");
            assert_eq!(button_names(&tree, detail), vec!["Create"]);
            assert_eq!(tree.remove_button(detail, edit), Err(TreeError::ButtonNotFound(edit)));
        }

        it "refuses to rename a button onto a sibling's name" {
            tree.add_buttons(detail, &ButtonTemplate::standard(None)[..2]).unwrap();
            let edit = tree.find(detail).unwrap().buttons[1].id;

            assert_eq!(
                tree.update_button(detail, edit, NodeField::Name("Create".to_string())),
                Err(TreeError::DuplicateButtonName { node: detail, name: "Create".to_string() })
            );
            assert_eq!(button_names(&tree, detail), vec!["Create", "Edit"]);

            tree.update_button(detail, edit, NodeField::Name("Edit".to_string())).unwrap();
            assert_eq!(button_names(&tree, detail), vec!["Create", "Edit"]);
        }
    }

    describe "serialization" {
        it "round-trips to a structurally equal tree" {
            tree.add_buttons(list, &ButtonTemplate::standard(Some(Tier::Medium))).unwrap();
            tree.update_field(detail, NodeField::IsImportant(true)).unwrap();

            let json = serde_json::to_string(&tree).unwrap();
            let restored: FeatureTree = serde_json::from_str(&json).unwrap();

            assert_eq!(restored, tree);
            assert_eq!(restored.find(list).unwrap().parent_id, Some(contacts));
        }

        it "gives repeated ids fresh values when reading" {
            let shared = Uuid::new_v4();
            let json = serde_json::json!([
                { "id": shared, "name": "First" },
                { "id": shared, "name": "Second" }
            ]);
            let mut restored: FeatureTree = serde_json::from_value(json).unwrap();

            let ids: Vec<Uuid> = restored.roots().iter().map(|n| n.id).collect();
            assert_eq!(ids[0], shared);
            assert_ne!(ids[1], shared);

            restored.delete_node(shared).unwrap();
            assert_eq!(names(restored.roots()), vec!["Second"]);
        }
    }

    describe "history" {
        before {
            let mut history = HistoryManager::starting_from(tree.clone(), 10);
            let original = tree.clone();
        }

        it "restores the previous version on undo" {
            tree.update_field(list, NodeField::Name("All contacts".to_string())).unwrap();
            history.commit(&tree);
            let renamed = tree.clone();
            tree.delete_node(reports).unwrap();
            history.commit(&tree);

            assert_eq!(history.undo(), Some(renamed.clone()));
            assert_eq!(history.undo(), Some(original.clone()));
            assert_eq!(history.undo(), None);
        }

        it "redo after undo returns the same version" {
            tree.delete_node(detail).unwrap();
            history.commit(&tree);

            history.undo().unwrap();
            assert_eq!(history.redo(), Some(tree.clone()));
            assert_eq!(history.redo(), None);
        }

        it "drops the redo branch on a new commit" {
            tree.delete_node(detail).unwrap();
            history.commit(&tree);
            history.undo().unwrap();

            let mut branch = original.clone();
            branch.delete_node(reports).unwrap();
            history.commit(&branch);

            assert!(!history.can_redo());
            assert_eq!(history.len(), 2);
            assert_eq!(history.current(), &branch);
        }

        it "evicts the oldest version past capacity" {
            let mut small = HistoryManager::starting_from(original.clone(), 3);
            for i in 0..5 {
                tree.update_field(list, NodeField::Name(format!("v{}", i))).unwrap();
                small.commit(&tree);
            }

            assert_eq!(small.len(), 3);
            assert_eq!(small.undo().unwrap().find(list).unwrap().name, "v3");
            assert_eq!(small.undo().unwrap().find(list).unwrap().name, "v2");
            assert!(small.undo().is_none());
        }
    }
}
