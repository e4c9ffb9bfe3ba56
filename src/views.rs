use std::collections::BTreeMap;

use crate::models::{Counts, Question, QuestionCard, Status, StatusGroup};

pub fn active(questions: &[Question]) -> Vec<&Question> {
    questions.iter().filter(|q| q.is_active()).collect()
}

/// Active questions, most votes first; among equal votes the newer (higher id) first.
pub fn display_order(questions: &[Question]) -> Vec<&Question> {
    let mut v = active(questions);
    v.sort_by(|a, b| b.votes.cmp(&a.votes).then(b.id.cmp(&a.id)));
    v
}

pub fn cards(questions: &[Question]) -> Vec<QuestionCard> {
    display_order(questions)
        .into_iter()
        .map(|q| QuestionCard { question: q.clone(), badge: q.status.badge().to_string() })
        .collect()
}

/// `total` counts active questions only; `pending` and `asked` count every
/// row whose status matches, deleted rows included.
pub fn counts(questions: &[Question]) -> Counts {
    Counts {
        total: active(questions).len(),
        pending: questions.iter().filter(|q| q.status == Status::Pending).count(),
        asked: questions.iter().filter(|q| q.status == Status::Asked).count(),
    }
}

/// Per-status record count, mean votes (1 decimal) and total votes over the
/// active questions, ordered by status name.
pub fn status_aggregate(questions: &[Question]) -> Vec<StatusGroup> {
    let mut groups: BTreeMap<&str, (&Status, usize, i64)> = BTreeMap::new();
    for q in active(questions) {
        let g = groups.entry(q.status.as_str()).or_insert((&q.status, 0, 0));
        g.1 += 1;
        g.2 += q.votes;
    }
    groups
        .into_values()
        .map(|(status, count, total_votes)| StatusGroup {
            status: status.clone(),
            count,
            mean_votes: (total_votes as f64 / count as f64 * 10.0).round() / 10.0,
            total_votes,
        })
        .collect()
}
