//! Prompt assembly for AI-completed lesson plans.
//!
//! The prompt is built from blocks: the backward-design rule, the optional
//! education model, the category's minimum requirements, the genre's source
//! material, the form values and the return format. Blocks that have nothing
//! to say are left out.

use std::fmt::Write as _;

use crate::models::{Category, EducationModel, LessonForm, Viewpoint};

/// Length cap for the education-model block, in characters.
pub const EDUCATION_BLOCK_LIMIT: usize = 2000;
const OMITTED_MARKER: &str = "\n（…以下省略）";

/// Builds the full prompt for the current form.
pub fn build_prompt(
    form: &LessonForm,
    category: Category,
    education_model: Option<&EducationModel>,
) -> String {
    let hours = form.lesson_count();
    let mut prompt = String::new();

    prompt.push_str("あなたは小学校の国語授業プランナーです。\n");
    prompt.push_str(
        "必ず学習指導要領に沿い、入力情報と3観点評価の整合をとり、実行可能で具体的な授業案を作成してください。\n\n",
    );

    prompt.push_str("【最重要：単元の逆算構造（言語活動をゴールにする）】\n");
    prompt.push_str("- 「言語活動の工夫」に書かれた活動が、単元の最終成果（ゴール）になるようにする。\n");
    let _ = writeln!(
        prompt,
        "- 最終時（{hours}時間目）でゴールの活動が成立するように、1時間目から準備・練習・読み取り・交流が積み上がる流れにする。"
    );
    prompt.push_str("- 各時間の文章の中に、その時間が“ゴールに向けて何を整えるのか”が自然に分かるように書く。\n\n");

    if let Some(block) = education_model.map(education_model_block) {
        prompt.push_str(&block);
        prompt.push_str("\n\n");
    }

    let _ = writeln!(prompt, "【作成モデル（4分類 / 最低要件）：{}】", category.label());
    prompt.push_str(&category_guidelines(category, &form.grade));
    prompt.push_str("\n\n");

    if let Some(block) = genre_material_block(form) {
        prompt.push_str(&block);
        prompt.push_str("\n\n");
    }

    let _ = writeln!(prompt, "【教科書名】{}", form.subject);
    let _ = writeln!(prompt, "【学年】{}", form.grade);
    let _ = writeln!(prompt, "【ジャンル】{}", form.genre);
    let _ = writeln!(prompt, "【教材名】{}", form.unit);
    let _ = writeln!(prompt, "【授業時間数】{hours}\n");

    let _ = writeln!(prompt, "■ 単元の目標:\n{}\n", form.unit_goal);

    prompt.push_str("■ 評価の観点:\n");
    let criteria: Vec<String> = Viewpoint::ALL
        .iter()
        .map(|v| {
            format!(
                "{}={}",
                v.label(),
                form.evaluation_points.get(*v).join("、")
            )
        })
        .collect();
    let _ = writeln!(prompt, "{}\n", criteria.join(";\n"));

    let _ = writeln!(prompt, "■ 育てたい子どもの姿:\n{}\n", form.child_vision);

    prompt.push_str("■ 授業の流れ（先生入力／空欄はAIが補完）:\n");
    for (i, step) in form.lesson_plan_list.iter().enumerate() {
        let _ = writeln!(prompt, "{}時間目: {}", i + 1, step.trim());
    }
    prompt.push('\n');
    prompt.push_str("※上記で「n時間目: 」だけ書かれている箇所は、AI が補完して埋めてください。\n");
    prompt.push_str(
        "※先生が書いた内容は上書きせず、矛盾がある場合のみ整合する範囲で最小修正してください。\n\n",
    );

    let _ = writeln!(
        prompt,
        "■ 言語活動の工夫（ゴールの活動の具体）:\n{}\n",
        form.language_activities
    );

    prompt.push_str(&return_format(hours));
    prompt.trim().to_string()
}

fn return_format(hours: usize) -> String {
    format!(
        r#"—返却フォーマット（必ずJSONのみ。前後に文章を付けない）—
{{
  "教科書名": string,
  "学年": string,
  "ジャンル": string,
  "教材名": string,
  "授業時間数": number,
  "単元の目標": string,
  "評価の観点": {{
    "知識・技能": string[],
    "思考・判断・表現": string[],
    "主体的に学習に取り組む態度": string[]
  }},
  "育てたい子どもの姿": string,
  "授業の流れ": {{
    "1時間目": string,
    "...": string,
    "{hours}時間目": string
  }},
  "言語活動の工夫": string,
  "結果": string
}}

制約（重要）：
- 「授業の流れ」のキーは必ず「1時間目」〜「{hours}時間目」まで全て出す（欠けは禁止）。
- 各時間目の値は、見出しや箇条書きにせず、連続した文章（1〜2段落）で書く（冒頭に「〇時間目は…」の型文は不要）。
- 各時間に、教師の問い（発問）を最低1つ、文章中に自然に含める。
- 各時間に、活動形態（個人/ペア/全体/グループ）を文章中に明記する。
- 各時間に、本文根拠（叙述・言葉）や、説明文なら段落・構造、詩なら言葉の響き等の根拠が入ること。"#
    )
}

/// True for 1年 and 2年.
fn is_lower_grade(grade: &str) -> bool {
    let grade = grade.trim_start();
    grade.starts_with("1年") || grade.starts_with("2年")
}

/// Minimum requirements every plan of the category must meet.
pub fn category_guidelines(category: Category, grade: &str) -> String {
    let mut common = vec![
        "・学習指導要領に照らして、3観点（知識・技能／思考・判断・表現／主体的に学習に取り組む態度）の整合をとる。",
        "・各時間の『授業の流れ』は、次の4要素を必ず含める：①教師の手立て（発問・提示・板書・ICT）②子どもの活動（個→ペア→全体等）③教材の根拠（本文の叙述・資料・例文等）④見取る評価（どの観点をどこで）。",
        "・1時間目あたり120〜200字程度を目安に具体化する（短すぎる一般論は禁止）。",
        "・時間配分は、導入→探究→統合→振り返りの積み上がりが分かるようにする。",
        "・教師の言葉（問い）と、子どものアウトプット（発言・ノート・ワークシート等）が見える形で書く。",
    ];
    if is_lower_grade(grade) {
        common.push(
            "・低学年では『テーマ』など抽象度が高い語は避け、人物の行動・気持ち・ことば、読み取ったことの共有など、具体で扱う。",
        );
    }

    let specific: &[&str] = match category {
        Category::Reading => &[
            "【読解（読むこと中心）としての最低要件】",
            "・本文の叙述に必ず戻り、根拠（言葉・文・段落）を押さえて解釈が進む構造にする。",
            "・発問は『叙述→解釈→交流→再解釈』の循環になるように設計する。",
            "・学年に応じて、本文理解の支援（音読・挿絵・場面分け・人物表等）を入れる。",
            "・交流は“根拠付きで説明”を促す（理由の言語化）。",
        ],
        Category::Discussion => &[
            "【話し合い（話す・聞く中心）としての最低要件】",
            "・目的（比べる／整理する／合意形成／問いを深める）を明確にし、役割・型（例：一言共有→理由→質問）を設定する。",
            "・聞く活動が可視化される工夫（メモ、うなずき、要約、リフレーズ等）を入れる。",
            "・発話が苦手な子にも参加できる支援（文型、カード、選択肢、ペア先行）を入れる。",
            "・話し合いの成果物（まとめ、共同板書、振り返り）を設定する。",
        ],
        Category::Writing => &[
            "【作文（書くこと中心）としての最低要件】",
            "・構想→下書き→推敲→共有のプロセスを授業の中で段階化する。",
            "・書くための材料集め（経験・資料・本文・メモ）と、文章構成（はじめ/中/おわり等）の支援を入れる。",
            "・推敲の観点（内容／構成／表現／誤字脱字等）を具体化し、チェック方法（ペア推敲等）を設計する。",
            "・完成の基準（評価規準）と提出形態（ノート／プリント／ICT）を明確にする。",
        ],
        Category::LanguageActivity => &[
            "【言語活動（言葉の働き・言語文化を活かす活動）としての最低要件】",
            "・語彙、表現、文の組み立て、言葉のきまり等を“使ってみる”活動に落とす（練習→活用）。",
            "・活動の目的（伝える／比べる／整える／説明する等）を明確にし、言語材料（語句・表現例）を提示する。",
            "・誤りを学びに変える場面（言い換え、整える、推敲）を入れる。",
            "・実生活や他教科につながる活用場面を一部に入れる。",
        ],
    };

    format!("{}\n\n{}", common.join("\n"), specific.join("\n"))
}

/// The education-model block, capped at [`EDUCATION_BLOCK_LIMIT`] characters.
pub fn education_model_block(model: &EducationModel) -> String {
    let optional = |label: &str, value: &str| {
        (!value.is_empty()).then(|| format!("・{label}：{value}"))
    };

    let mut lines = vec![
        "【教育観モデル（最優先）】".to_string(),
        format!("・モデル名：{}", model.name),
    ];
    lines.extend(optional("作成者", &model.creator_name));
    lines.extend(optional("教育観", &model.philosophy));
    lines.extend(optional("評価観点の重視点", &model.evaluation_focus));
    lines.extend(optional("言語活動の重視点", &model.language_focus));
    lines.extend(optional("育てたい子どもの姿", &model.child_focus));
    lines.push(
        "※上の教育観モデルを最優先の判断基準として授業案を作成せよ。4分類モデルは指導要領に沿うための最低要件として満たし、衝突した場合は教育観モデルを優先しつつ最低要件が失われないよう形を調整する。"
            .to_string(),
    );

    let block = lines.join("\n");
    if block.chars().count() > EDUCATION_BLOCK_LIMIT {
        let mut truncated: String = block.chars().take(EDUCATION_BLOCK_LIMIT).collect();
        truncated.push_str(OMITTED_MARKER);
        truncated
    } else {
        block
    }
}

/// Source material for 物語文, 説明文 and 詩; `None` for other genres.
pub fn genre_material_block(form: &LessonForm) -> Option<String> {
    let m = &form.materials;
    let line = |label: &str, short: &str, value: &str| {
        if value.is_empty() {
            format!("・{short}：")
        } else {
            format!("・{label}：{value}")
        }
    };

    let lines = match form.genre.trim() {
        "物語文" => [
            "【物語文の素材（本文に具体化して反映）】".to_string(),
            line("中心人物", "中心人物", &m.story_main),
            line("対人物（中心人物と対になる人物）", "対人物", &m.story_counter),
            line("舞台（いつ／どこ）", "舞台", &m.story_setting),
            line("山場（大事な場面）", "山場", &m.story_climax),
            "※授業の流れには、上の人物名・場面語を自然に必ず含め、本文の叙述（言葉・文）に戻って話し合えるようにする。".to_string(),
        ],
        "説明文" => [
            "【説明文の素材（本文に具体化して反映）】".to_string(),
            line("題材（何について）", "題材", &m.ex_topic),
            line("筆者の目的（何を伝えたい）", "筆者の目的", &m.ex_purpose),
            line(
                "文章構造（例：はじめ→中→おわり／問い→答え／理由→例）",
                "文章構造",
                &m.ex_structure,
            ),
            line("キーワード（大事な言葉）", "キーワード", &m.ex_keywords),
            "※授業の流れには、上の用語を自然に必ず含め、段落や構造に着目して読み取れるようにする。".to_string(),
        ],
        "詩" => [
            "【詩の素材（本文に具体化して反映）】".to_string(),
            line("語り手（だれの声）", "語り手", &m.poem_speaker),
            line("気持ち（どんな感じ）", "気持ち", &m.poem_feelings),
            line("情景イメージ（見えるもの／聞こえるもの）", "情景イメージ", &m.poem_imagery),
            line(
                "くり返し／リズム（気づかせたい言い方）",
                "くり返し／リズム",
                &m.poem_repetition,
            ),
            "※授業の流れには、音・リズム・くり返し・情景を扱う活動を自然に必ず含め、感じたことを言葉で確かめられるようにする。".to_string(),
        ],
        _ => return None,
    };

    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> LessonForm {
        let mut form = LessonForm::default();
        form.grade = "3年".to_string();
        form.unit = "ちいちゃんのかげおくり".to_string();
        form.set_hours("3");
        form.set_lesson(0, "音読する").unwrap();
        form
    }

    #[test]
    fn test_prompt_lists_every_lesson_key() {
        let prompt = build_prompt(&form(), Category::Reading, None);
        assert!(prompt.starts_with("あなたは小学校の国語授業プランナーです。"));
        assert!(prompt.contains("1時間目: 音読する"));
        assert!(prompt.contains("3時間目: \n"));
        assert!(prompt.contains("\"3時間目\": string"));
        assert!(prompt.contains("【作成モデル（4分類 / 最低要件）：読解】"));
        assert!(!prompt.contains("【教育観モデル（最優先）】"));
    }

    #[test]
    fn test_lower_grades_get_concreteness_rule() {
        assert!(category_guidelines(Category::Writing, "1年").contains("低学年"));
        assert!(category_guidelines(Category::Writing, "2年生").contains("低学年"));
        assert!(!category_guidelines(Category::Writing, "3年").contains("低学年"));
        assert!(!category_guidelines(Category::Writing, "12年").contains("低学年"));
    }

    #[test]
    fn test_education_block_is_truncated() {
        let model = EducationModel {
            name: "探究型".to_string(),
            philosophy: "あ".repeat(3000),
            ..Default::default()
        };
        let block = education_model_block(&model);
        assert!(block.ends_with("（…以下省略）"));
        assert_eq!(
            block.chars().count(),
            EDUCATION_BLOCK_LIMIT + OMITTED_MARKER.chars().count()
        );

        let short = education_model_block(&EducationModel {
            name: "対話型".to_string(),
            ..Default::default()
        });
        assert!(short.contains("・モデル名：対話型"));
        assert!(!short.contains("作成者"));
    }

    #[test]
    fn test_genre_material_block() {
        let mut form = form();
        form.materials.story_main = "ちいちゃん".to_string();
        let block = genre_material_block(&form).unwrap();
        assert!(block.contains("・中心人物：ちいちゃん"));
        assert!(block.contains("・対人物："));

        form.genre = "その他".to_string();
        assert!(genre_material_block(&form).is_none());
    }
}
