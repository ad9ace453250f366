use crate::commits::CommitRecord;

const REPORT_TEMPLATE: &str = r#"以下のgit commitのデータを見て、日報形式でまとめてください：

{commit_summary}

以下の項目に分けて作成してください：

①今日の目標
②今日の業務内容
③今日の成果
④今日の良かった点
⑤今日の反省点

以下の日報形式を参考にしてください：

今日の目標
納品処理における作業効率のアップを図り、就業時間内に3件終わらせる

今日の業務内容
9:00～11:00　社内にて会議
11:00～12:00　電話とメールの対応
※〇〇社からのシステムトラブルによるクレームが発生
13:00～14:30　～社のトラブル対応
※〇〇社のクレーム対応を終え、システムトラブルの解決
14:30～16:30　3件分の納品処理
16:30～18:00　プロジェクトミーティング

今日の成果
〇〇社によるシステムトラブルが発生したものの、納品処理の作業に慣れてきたことで、目標通り3件分の納品処理ができました。

今日の良かった点
システムトラブルの対応にあたって、素早く解決策について連絡することで、〇〇社にご安心いただけました。トラブル対応にあたって、スピード感と具体的な解決策の提案が重要であることを再認識できました。

今日の反省点
目標であった納品作業件数は達成できましたが、今日のように急なトラブル対応があった際にも、さらにスムーズに納品作業が行えるよう改善していきます。

上記の形式を参考に、提供されたコミットデータに基づいて具体的な日報を作成してください。"#;

/// One date/author/message block per commit, in input order.
pub fn commit_summary(commits: &[CommitRecord]) -> String {
    commits
        .iter()
        .map(|commit| {
            format!(
                "日時: {}\n作者: {}\nコミット: {}\n\n",
                commit.authored_at, commit.author_name, commit.message
            )
        })
        .collect()
}

pub fn daily_report_prompt(commits: &[CommitRecord]) -> String {
    REPORT_TEMPLATE.replacen("{commit_summary}", &commit_summary(commits), 1)
}

#[cfg(test)]
mod tests {
    use super::{commit_summary, daily_report_prompt};
    use crate::commits::sample;

    #[test]
    fn summary_lists_commits_in_order() {
        let commits = vec![
            sample("b", "2024-01-02T10:00:00Z"),
            sample("a", "2024-01-01T10:00:00Z"),
        ];

        assert_eq!(
            commit_summary(&commits),
            "日時: 2024-01-02T10:00:00Z\n作者: A\nコミット: commit b\n\n日時: 2024-01-01T10:00:00Z\n作者: A\nコミット: commit a\n\n"
        );
    }

    #[test]
    fn prompt_embeds_summary_before_the_sections() {
        let prompt = daily_report_prompt(&[sample("abc", "2024-01-01T10:00:00Z")]);

        let summary_at = prompt.find("コミット: commit abc").expect("summary present");
        let sections_at = prompt.find("①今日の目標").expect("sections present");
        assert!(summary_at < sections_at);
        assert!(!prompt.contains("{commit_summary}"));
    }

    #[test]
    fn empty_commit_list_still_builds_a_prompt() {
        let prompt = daily_report_prompt(&[]);

        assert!(prompt.starts_with("以下のgit commitのデータを見て、日報形式でまとめてください：\n\n\n\n以下の項目"));
        assert!(prompt.contains("⑤今日の反省点"));
        assert!(!prompt.contains("{commit_summary}"));
    }
}
